use serde::{Deserialize, Serialize};

/// One invocation's worth of indicator readings.
///
/// Every field may be unset when its upstream source failed. Consumers treat
/// `None` as unknown, never as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Latest close of the reference asset.
    pub price: Option<f64>,
    /// Trailing mean of the reference asset's closes.
    pub moving_average: Option<f64>,
    /// RSI on a 0..=100 scale.
    pub rsi: Option<f64>,
    pub vix: Option<f64>,
    pub fear_greed_index: Option<u8>,
    pub put_call_ratio: Option<f64>,
}

impl IndicatorSnapshot {
    /// A snapshot with every reading unset.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Price and moving average, when both are present and finite.
    pub fn price_and_average(&self) -> Option<(f64, f64)> {
        match (self.price, self.moving_average) {
            (Some(p), Some(ma)) if p.is_finite() && ma.is_finite() => Some((p, ma)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_fully_unset() {
        let s = IndicatorSnapshot::unknown();
        assert!(s.is_empty());
        assert_eq!(s.price, None);
        assert_eq!(s.fear_greed_index, None);
    }

    #[test]
    fn price_and_average_requires_both() {
        let mut s = IndicatorSnapshot {
            price: Some(90.0),
            ..IndicatorSnapshot::unknown()
        };
        assert_eq!(s.price_and_average(), None);
        s.moving_average = Some(100.0);
        assert_eq!(s.price_and_average(), Some((90.0, 100.0)));
        s.moving_average = Some(f64::NAN);
        assert_eq!(s.price_and_average(), None);
    }
}
