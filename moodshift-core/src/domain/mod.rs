//! Domain types shared by the interpreters, the strategy engine and the
//! data layer.

pub mod month;
pub mod snapshot;

pub use month::{CalendarMonth, MonthError};
pub use snapshot::IndicatorSnapshot;
