//! Strategy engine: monthly shift from the defensive to the aggressive bucket.
//!
//! Each evaluation is classified afresh as Below-MA or At/Above-MA; only the
//! streak counter and the last trigger month carry over between calls.
//!
//! - Below-MA, new month: the streak grows by one and
//!   `min(streak * step, cap)` percent of the combined allocation moves into
//!   the aggressive bucket.
//! - Below-MA, same month as the last shift: nothing changes.
//! - At/Above-MA: the streak resets to zero. Buckets and the trigger month
//!   are left alone.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::AllocationState;
use crate::domain::{CalendarMonth, IndicatorSnapshot};

/// Outcome of one strategy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyAction {
    /// Price or moving average unavailable; state untouched.
    InsufficientData,
    /// Below the average, but this month's shift already happened.
    AlreadyApplied { month: CalendarMonth },
    /// Moved `shift_amount` percentage points (`shift_pct` of the total).
    Shifted { shift_pct: u32, shift_amount: f64 },
    /// At or above the average; streak cleared.
    ResetAboveAverage,
}

impl StrategyAction {
    /// Whether the evaluation changed the allocation split.
    pub fn is_shift(&self) -> bool {
        matches!(self, StrategyAction::Shifted { .. })
    }
}

impl fmt::Display for StrategyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyAction::InsufficientData => f.write_str("insufficient data"),
            StrategyAction::AlreadyApplied { .. } => {
                f.write_str("shift already applied this month")
            }
            StrategyAction::Shifted { shift_pct, .. } => {
                write!(f, "shifted {shift_pct}% into aggressive bucket")
            }
            StrategyAction::ResetAboveAverage => f.write_str("reset — above moving average"),
        }
    }
}

/// Escalation schedule for the monthly shift percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSchedule {
    /// Percentage added per consecutive qualifying month.
    pub step_pct: u32,
    /// Upper bound on a single month's shift percentage.
    pub cap_pct: u32,
}

impl Default for ShiftSchedule {
    fn default() -> Self {
        Self {
            step_pct: 5,
            cap_pct: 100,
        }
    }
}

impl ShiftSchedule {
    pub fn new(step_pct: u32, cap_pct: u32) -> Self {
        Self { step_pct, cap_pct }
    }

    /// Shift percentage for the given streak length.
    pub fn shift_pct(&self, month_counter: u32) -> u32 {
        month_counter.saturating_mul(self.step_pct).min(self.cap_pct)
    }

    /// Evaluate one invocation against `state`.
    ///
    /// Returns the successor state and the action taken. The input state is
    /// never modified; callers decide whether to persist the result.
    pub fn update(
        &self,
        state: &AllocationState,
        snapshot: &IndicatorSnapshot,
        month: CalendarMonth,
    ) -> (AllocationState, StrategyAction) {
        let Some((price, moving_average)) = snapshot.price_and_average() else {
            return (*state, StrategyAction::InsufficientData);
        };

        let mut next = *state;

        if price >= moving_average {
            next.month_counter = 0;
            return (next, StrategyAction::ResetAboveAverage);
        }

        if state.last_triggered_month == Some(month) {
            return (next, StrategyAction::AlreadyApplied { month });
        }

        next.month_counter = state.month_counter.saturating_add(1);
        next.last_triggered_month = Some(month);

        let shift_pct = self.shift_pct(next.month_counter);
        let shift_amount = next.total_pct() * f64::from(shift_pct) / 100.0;
        next.bucket_a_pct -= shift_amount;
        next.bucket_b_pct += shift_amount;

        debug_assert!(
            next.validate().is_ok(),
            "shift broke the bucket invariant: {next:?}"
        );
        tracing::debug!(
            month = %month,
            month_counter = next.month_counter,
            shift_pct,
            shift_amount,
            "allocation shifted"
        );

        (
            next,
            StrategyAction::Shifted {
                shift_pct,
                shift_amount,
            },
        )
    }
}

/// Evaluate with the default schedule (5% per month, capped at 100%).
pub fn update_strategy(
    state: &AllocationState,
    snapshot: &IndicatorSnapshot,
    month: CalendarMonth,
) -> (AllocationState, StrategyAction) {
    ShiftSchedule::default().update(state, snapshot, month)
}
