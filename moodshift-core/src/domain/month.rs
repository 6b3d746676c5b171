use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Calendar month number, always within 1..=12.
///
/// The shift trigger is keyed on this value alone; March of one year and
/// March of the next compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CalendarMonth(u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("calendar month must be within 1..=12, got {0}")]
pub struct MonthError(pub u32);

impl CalendarMonth {
    pub fn new(month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(month as u8))
    }

    /// Month component of a date or timestamp.
    pub fn of(date: &impl Datelike) -> Self {
        Self(date.month() as u8)
    }

    pub fn number(self) -> u32 {
        u32::from(self.0)
    }
}

impl TryFrom<u32> for CalendarMonth {
    type Error = MonthError;

    fn try_from(month: u32) -> Result<Self, Self::Error> {
        Self::new(month).ok_or(MonthError(month))
    }
}

impl From<CalendarMonth> for u32 {
    fn from(month: CalendarMonth) -> Self {
        month.number()
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
