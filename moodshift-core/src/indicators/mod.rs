//! Indicators computed over a chronological close series.
//!
//! Both indicators implement the `Indicator` trait: close history in, a series
//! of the same length out, with `f64::NAN` wherever the value is undefined.
//! Callers that only need the most recent value use `Indicator::latest`, which
//! maps NaN to `None` so absence never masquerades as zero.

pub mod rsi;
pub mod sma;

pub use rsi::Rsi;
pub use sma::Sma;

/// Trait for close-series indicators.
///
/// # Look-ahead guard
/// The value at index t may only depend on closes at indices <= t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_200", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading positions that are always NaN.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire close series.
    ///
    /// Returns a `Vec<f64>` of the same length as `closes`.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;

    /// Most recent fully-computed value, or `None` when undefined.
    fn latest(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() <= self.lookback() {
            return None;
        }
        self.compute(closes)
            .last()
            .copied()
            .filter(|v| v.is_finite())
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
