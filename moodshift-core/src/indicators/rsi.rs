//! Relative Strength Index (RSI).
//!
//! Uses a trailing simple mean of gains and losses over `period` changes
//! (not Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge case: avg_loss == 0 has no relative strength, so the value is NaN
//! ("no signal") rather than a pinned 100.

use super::Indicator;

/// Default RSI window.
pub const DEFAULT_RSI_PERIOD: usize = 14;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(DEFAULT_RSI_PERIOD)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        // changes[i] = closes[i] - closes[i-1]; changes[0] is undefined
        let changes: Vec<f64> = std::iter::once(f64::NAN)
            .chain(closes.windows(2).map(|w| w[1] - w[0]))
            .collect();

        for i in self.period..n {
            let window = &changes[(i + 1 - self.period)..=i];
            if window.iter().any(|c| c.is_nan()) {
                continue;
            }

            // Summed per window so an all-gain window yields an exact zero loss
            let gain_sum: f64 = window.iter().filter(|&&c| c > 0.0).sum();
            let loss_sum: f64 = window.iter().filter(|&&c| c < 0.0).map(|c| -c).sum();

            let avg_gain = gain_sum / self.period as f64;
            let avg_loss = loss_sum / self.period as f64;
            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return f64::NAN;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains_has_no_signal() {
        let rsi = Rsi::new(3);
        let closes = [100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        assert!(rsi.compute(&closes)[3].is_nan());
        assert_eq!(rsi.latest(&closes), None);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let rsi = Rsi::new(3);
        let result = rsi.compute(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        assert_approx(result[3], 0.0, 1e-9);
        assert_approx(result[5], 0.0, 1e-9);
    }

    #[test]
    fn rsi_mixed() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // Window ending at 3: gains 0.34, losses 0.73 → RSI = 100 - 100/(1 + 0.34/0.73)
        // Window ending at 4: gains 0.72, losses 0.73 → RSI = 100 - 100/(1 + 0.72/0.73)
        let closes = [44.0, 44.34, 44.09, 43.61, 44.33];
        let result = Rsi::new(3).compute(&closes);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + 0.72 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_drops_changes_outside_window() {
        // The large early loss leaves the 2-change window at the last bar
        let closes = [100.0, 50.0, 52.0, 51.0];
        let result = Rsi::new(2).compute(&closes);
        // Window ending at 3: +2, -1 → avg_gain 1.0, avg_loss 0.5
        assert_approx(result[3], 100.0 - 100.0 / 3.0, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let closes = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        let result = Rsi::new(3).compute(&closes);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!(
                    (0.0..=100.0).contains(&v),
                    "RSI out of bounds at index {i}: {v}"
                );
            }
        }
    }

    #[test]
    fn rsi_needs_window_plus_one_closes() {
        let rsi = Rsi::new(14);
        let closes: Vec<f64> = (0..14)
            .map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        assert_eq!(rsi.latest(&closes), None);

        let mut longer = closes.clone();
        longer.push(99.0);
        assert!(rsi.latest(&longer).is_some());
    }

    #[test]
    fn rsi_nan_in_window() {
        let closes = [100.0, 101.0, f64::NAN, 103.0, 102.0, 101.0, 100.0];
        let result = Rsi::new(2).compute(&closes);
        // Changes at 2 and 3 are NaN; windows ending at 2, 3, 4 are undefined
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        // Window ending at 5: -1, -1 → all losses → 0
        assert_approx(result[5], 0.0, 1e-9);
    }

    #[test]
    fn rsi_lookback_and_default() {
        assert_eq!(Rsi::new(14).lookback(), 14);
        assert_eq!(Rsi::default().period(), DEFAULT_RSI_PERIOD);
        assert_eq!(Rsi::default().name(), "rsi_14");
    }
}
