//! Indicator aggregation: provider outputs → `IndicatorSnapshot`.
//!
//! This is the fail-closed boundary. Providers report rich `DataError`s; each
//! one is logged here and collapsed to "unset", so nothing downstream ever
//! observes a transport failure.

use crate::data::{PriceHistoryProvider, SentimentProvider};
use crate::domain::IndicatorSnapshot;
use crate::indicators::{Indicator, Rsi, Sma};

/// Which symbols and windows feed the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationConfig {
    /// Asset whose price vs. moving average drives the shift decision.
    pub reference_symbol: String,
    pub ma_period: usize,
    /// Asset whose RSI is reported.
    pub rsi_symbol: String,
    pub rsi_window: usize,
    /// Closes requested for the RSI series.
    pub rsi_lookback: usize,
    pub volatility_symbol: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            reference_symbol: "QQQ".into(),
            ma_period: 200,
            rsi_symbol: "SPY".into(),
            rsi_window: 14,
            rsi_lookback: 200,
            volatility_symbol: "^VIX".into(),
        }
    }
}

/// Latest close and trailing `period` mean of `closes`.
///
/// Both are unset when fewer than `period` closes are available: a price
/// without its average cannot drive a decision.
pub fn reference_price_and_ma(closes: &[f64], period: usize) -> (Option<f64>, Option<f64>) {
    if period == 0 || closes.len() < period {
        return (None, None);
    }
    let price = closes.last().copied().filter(|p| p.is_finite());
    let moving_average = Sma::new(period).latest(closes);
    match (price, moving_average) {
        (Some(p), Some(ma)) => (Some(p), Some(ma)),
        _ => (None, None),
    }
}

/// Collects one snapshot from a price provider and a sentiment provider.
pub struct IndicatorAggregator<'a> {
    prices: &'a dyn PriceHistoryProvider,
    sentiment: &'a dyn SentimentProvider,
    config: AggregationConfig,
}

impl<'a> IndicatorAggregator<'a> {
    pub fn new(
        prices: &'a dyn PriceHistoryProvider,
        sentiment: &'a dyn SentimentProvider,
        config: AggregationConfig,
    ) -> Self {
        Self {
            prices,
            sentiment,
            config,
        }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Chronological closes for `symbol`; empty when the provider fails.
    pub fn fetch_closing_price_series(&self, symbol: &str, lookback: usize) -> Vec<f64> {
        match self.prices.closing_prices(symbol, lookback) {
            Ok(closes) => closes.into_iter().filter(|c| c.is_finite()).collect(),
            Err(e) => {
                tracing::warn!(
                    provider = self.prices.name(),
                    symbol,
                    error = %e,
                    "close series unavailable"
                );
                Vec::new()
            }
        }
    }

    pub fn fetch_reference_asset_price_and_ma(&self) -> (Option<f64>, Option<f64>) {
        let closes =
            self.fetch_closing_price_series(&self.config.reference_symbol, self.config.ma_period);
        let (price, ma) = reference_price_and_ma(&closes, self.config.ma_period);
        if price.is_none() && !closes.is_empty() {
            tracing::warn!(
                symbol = %self.config.reference_symbol,
                available = closes.len(),
                required = self.config.ma_period,
                "not enough history for the moving average"
            );
        }
        (price, ma)
    }

    pub fn fetch_volatility_index(&self) -> Option<f64> {
        self.fetch_closing_price_series(&self.config.volatility_symbol, 1)
            .last()
            .copied()
    }

    pub fn fetch_fear_greed_index(&self) -> Option<u8> {
        self.sentiment
            .fear_greed_index()
            .map_err(|e| {
                tracing::warn!(
                    provider = self.sentiment.name(),
                    error = %e,
                    "fear & greed index unavailable"
                );
            })
            .ok()
    }

    pub fn fetch_put_call_ratio(&self) -> Option<f64> {
        self.sentiment
            .put_call_ratio()
            .map_err(|e| {
                tracing::warn!(
                    provider = self.sentiment.name(),
                    error = %e,
                    "put/call ratio unavailable"
                );
            })
            .ok()
            .filter(|p| p.is_finite())
    }

    pub fn fetch_rsi(&self) -> Option<f64> {
        if self.config.rsi_window == 0 {
            return None;
        }
        let closes =
            self.fetch_closing_price_series(&self.config.rsi_symbol, self.config.rsi_lookback);
        Rsi::new(self.config.rsi_window).latest(&closes)
    }

    /// Query every source once and assemble the snapshot.
    pub fn snapshot(&self) -> IndicatorSnapshot {
        let (price, moving_average) = self.fetch_reference_asset_price_and_ma();
        let snapshot = IndicatorSnapshot {
            price,
            moving_average,
            rsi: self.fetch_rsi(),
            vix: self.fetch_volatility_index(),
            fear_greed_index: self.fetch_fear_greed_index(),
            put_call_ratio: self.fetch_put_call_ratio(),
        };
        tracing::info!(?snapshot, "indicator snapshot assembled");
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_and_ma_from_full_window() {
        let closes: Vec<f64> = (1..=200).map(|i| i as f64).collect();
        let (price, ma) = reference_price_and_ma(&closes, 200);
        assert_eq!(price, Some(200.0));
        assert_eq!(ma, Some(100.5));
    }

    #[test]
    fn short_history_unsets_both() {
        let closes: Vec<f64> = (1..=199).map(|i| i as f64).collect();
        assert_eq!(reference_price_and_ma(&closes, 200), (None, None));
        assert_eq!(reference_price_and_ma(&[], 200), (None, None));
    }

    #[test]
    fn zero_period_unsets_both() {
        assert_eq!(reference_price_and_ma(&[1.0, 2.0], 0), (None, None));
    }

    #[test]
    fn default_config_tracks_qqq_against_200_day_mean() {
        let config = AggregationConfig::default();
        assert_eq!(config.reference_symbol, "QQQ");
        assert_eq!(config.ma_period, 200);
        assert_eq!(config.rsi_symbol, "SPY");
        assert_eq!(config.rsi_window, 14);
        assert_eq!(config.volatility_symbol, "^VIX");
    }
}
