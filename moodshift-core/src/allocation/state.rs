//! Two-bucket allocation record.
//!
//! **Core rule:** `bucket_a_pct + bucket_b_pct == 100.0` in every reachable
//! state. The strategy engine only ever moves percentage points from one
//! bucket to the other, so the sum is conserved; `validate` exists to catch
//! defects and corrupted persisted state, not to repair them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::CalendarMonth;

/// Combined size of both buckets, in percent.
pub const TOTAL_PCT: f64 = 100.0;

/// Allowed drift of the bucket sum from `TOTAL_PCT`.
pub const SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("bucket percentages sum to {sum}, expected 100")]
    BucketSum { sum: f64 },

    #[error("bucket percentage is not finite: defensive={bucket_a_pct}, aggressive={bucket_b_pct}")]
    NonFinite { bucket_a_pct: f64, bucket_b_pct: f64 },
}

/// Persisted allocation split plus the monthly-shift streak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationState {
    /// Percentage held in the defensive asset.
    pub bucket_a_pct: f64,
    /// Percentage held in the aggressive asset.
    pub bucket_b_pct: f64,
    /// Consecutive qualifying (below-average) months since the last reset.
    pub month_counter: u32,
    /// Month of the last successful shift.
    pub last_triggered_month: Option<CalendarMonth>,
}

impl Default for AllocationState {
    fn default() -> Self {
        Self {
            bucket_a_pct: TOTAL_PCT,
            bucket_b_pct: 0.0,
            month_counter: 0,
            last_triggered_month: None,
        }
    }
}

impl AllocationState {
    /// Fully defensive, no streak, never triggered.
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn total_pct(&self) -> f64 {
        self.bucket_a_pct + self.bucket_b_pct
    }

    /// Check the bucket invariants.
    ///
    /// `month_counter >= 0` and the 1..=12 month range are enforced by the
    /// field types and need no runtime check.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if !self.bucket_a_pct.is_finite() || !self.bucket_b_pct.is_finite() {
            return Err(InvariantViolation::NonFinite {
                bucket_a_pct: self.bucket_a_pct,
                bucket_b_pct: self.bucket_b_pct,
            });
        }
        let sum = self.total_pct();
        if (sum - TOTAL_PCT).abs() > SUM_TOLERANCE {
            return Err(InvariantViolation::BucketSum { sum });
        }
        Ok(())
    }
}
