//! Evaluation: the structured result handed to presentation.
//!
//! Bundles the snapshot, its interpreted labels, the strategy action and the
//! successor state, stamped with the evaluation time. The calendar month fed
//! to the strategy engine is the month component of that timestamp.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationState, ShiftSchedule, StrategyAction};
use crate::domain::{CalendarMonth, IndicatorSnapshot};
use crate::sentiment::SentimentReadout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub evaluated_at: NaiveDateTime,
    pub snapshot: IndicatorSnapshot,
    pub readout: SentimentReadout,
    pub action: StrategyAction,
    /// State after the action was applied.
    pub state: AllocationState,
}

impl Evaluation {
    pub fn month(&self) -> CalendarMonth {
        CalendarMonth::of(&self.evaluated_at)
    }
}

/// Evaluate with the default shift schedule.
pub fn evaluate(
    state: &AllocationState,
    snapshot: &IndicatorSnapshot,
    now: NaiveDateTime,
) -> Evaluation {
    evaluate_with(&ShiftSchedule::default(), state, snapshot, now)
}

pub fn evaluate_with(
    schedule: &ShiftSchedule,
    state: &AllocationState,
    snapshot: &IndicatorSnapshot,
    now: NaiveDateTime,
) -> Evaluation {
    let (next, action) = schedule.update(state, snapshot, CalendarMonth::of(&now));
    Evaluation {
        evaluated_at: now,
        snapshot: *snapshot,
        readout: SentimentReadout::from_snapshot(snapshot),
        action,
        state: next,
    }
}
