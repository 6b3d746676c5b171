//! Sentiment interpreters: raw indicator readings → closed label enums.
//!
//! Every interpreter is total over `Option` input. An unset or non-finite
//! reading maps to the `Unknown` variant. Band boundaries belong to the band
//! above the strict comparison (15.0 on VIX is moderate, 30.0 on RSI is
//! neutral).
//!
//! The labels follow a contrarian model: calm, greedy markets carry a sell
//! hint and fearful, volatile markets carry a buy hint. Display strings are
//! produced only through `Display`, never consulted by decision logic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::IndicatorSnapshot;

/// Directional hint carried by a sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeHint {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TradeHint::Buy => "buy signal",
            TradeHint::Sell => "sell signal",
            TradeHint::Hold => "wait",
        })
    }
}

/// Common surface of the four label enums.
pub trait SentimentLabel: fmt::Display + Copy {
    /// Trading hint, `None` when the reading is unknown.
    fn hint(&self) -> Option<TradeHint>;

    fn is_known(&self) -> bool {
        self.hint().is_some()
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

// ── VIX ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VixLabel {
    Unknown,
    /// VIX < 15: bullish complacency.
    LowVolatility,
    /// 15 <= VIX < 25.
    ModerateVolatility,
    /// VIX >= 25: bearish stress.
    HighVolatility,
}

pub fn interpret_vix(vix: Option<f64>) -> VixLabel {
    match finite(vix) {
        None => VixLabel::Unknown,
        Some(v) if v < 15.0 => VixLabel::LowVolatility,
        Some(v) if v < 25.0 => VixLabel::ModerateVolatility,
        Some(_) => VixLabel::HighVolatility,
    }
}

impl SentimentLabel for VixLabel {
    fn hint(&self) -> Option<TradeHint> {
        match self {
            VixLabel::Unknown => None,
            VixLabel::LowVolatility => Some(TradeHint::Sell),
            VixLabel::ModerateVolatility => Some(TradeHint::Hold),
            VixLabel::HighVolatility => Some(TradeHint::Buy),
        }
    }
}

impl fmt::Display for VixLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VixLabel::Unknown => "unknown",
            VixLabel::LowVolatility => "Low Volatility (Bullish)",
            VixLabel::ModerateVolatility => "Moderate Volatility (Neutral)",
            VixLabel::HighVolatility => "High Volatility (Bearish)",
        })
    }
}

// ── Fear & Greed ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FearGreedLabel {
    Unknown,
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

pub fn interpret_fear_greed(index: Option<u8>) -> FearGreedLabel {
    match index {
        None => FearGreedLabel::Unknown,
        Some(0..=25) => FearGreedLabel::ExtremeFear,
        Some(26..=45) => FearGreedLabel::Fear,
        Some(46..=55) => FearGreedLabel::Neutral,
        Some(56..=75) => FearGreedLabel::Greed,
        Some(_) => FearGreedLabel::ExtremeGreed,
    }
}

impl SentimentLabel for FearGreedLabel {
    fn hint(&self) -> Option<TradeHint> {
        match self {
            FearGreedLabel::Unknown => None,
            FearGreedLabel::ExtremeFear | FearGreedLabel::Fear => Some(TradeHint::Buy),
            FearGreedLabel::Neutral => Some(TradeHint::Hold),
            FearGreedLabel::Greed | FearGreedLabel::ExtremeGreed => Some(TradeHint::Sell),
        }
    }
}

impl fmt::Display for FearGreedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FearGreedLabel::Unknown => "unknown",
            FearGreedLabel::ExtremeFear => "Extreme Fear",
            FearGreedLabel::Fear => "Fear",
            FearGreedLabel::Neutral => "Neutral",
            FearGreedLabel::Greed => "Greed",
            FearGreedLabel::ExtremeGreed => "Extreme Greed",
        })
    }
}

// ── Put/Call ratio ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutCallLabel {
    Unknown,
    /// Ratio > 0.95: heavy put buying.
    Bearish,
    Neutral,
    /// Ratio < 0.65: heavy call buying.
    Bullish,
}

pub fn interpret_put_call(ratio: Option<f64>) -> PutCallLabel {
    match finite(ratio) {
        None => PutCallLabel::Unknown,
        Some(p) if p > 0.95 => PutCallLabel::Bearish,
        Some(p) if p < 0.65 => PutCallLabel::Bullish,
        Some(_) => PutCallLabel::Neutral,
    }
}

impl SentimentLabel for PutCallLabel {
    fn hint(&self) -> Option<TradeHint> {
        match self {
            PutCallLabel::Unknown => None,
            PutCallLabel::Bearish => Some(TradeHint::Buy),
            PutCallLabel::Neutral => Some(TradeHint::Hold),
            PutCallLabel::Bullish => Some(TradeHint::Sell),
        }
    }
}

impl fmt::Display for PutCallLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PutCallLabel::Unknown => "unknown",
            PutCallLabel::Bearish => "Bearish",
            PutCallLabel::Neutral => "Neutral",
            PutCallLabel::Bullish => "Bullish",
        })
    }
}

// ── RSI ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiLabel {
    Unknown,
    Oversold,
    Neutral,
    Overbought,
}

pub fn classify_rsi(rsi: Option<f64>) -> RsiLabel {
    match finite(rsi) {
        None => RsiLabel::Unknown,
        Some(r) if r < 30.0 => RsiLabel::Oversold,
        Some(r) if r > 70.0 => RsiLabel::Overbought,
        Some(_) => RsiLabel::Neutral,
    }
}

impl SentimentLabel for RsiLabel {
    fn hint(&self) -> Option<TradeHint> {
        match self {
            RsiLabel::Unknown => None,
            RsiLabel::Oversold => Some(TradeHint::Buy),
            RsiLabel::Neutral => Some(TradeHint::Hold),
            RsiLabel::Overbought => Some(TradeHint::Sell),
        }
    }
}

impl fmt::Display for RsiLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RsiLabel::Unknown => "unknown",
            RsiLabel::Oversold => "oversold",
            RsiLabel::Neutral => "neutral",
            RsiLabel::Overbought => "overbought",
        })
    }
}

// ── Readout ──────────────────────────────────────────────────────────

/// The four interpreted labels for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentReadout {
    pub vix: VixLabel,
    pub fear_greed: FearGreedLabel,
    pub put_call: PutCallLabel,
    pub rsi: RsiLabel,
}

impl SentimentReadout {
    pub fn from_snapshot(snapshot: &IndicatorSnapshot) -> Self {
        Self {
            vix: interpret_vix(snapshot.vix),
            fear_greed: interpret_fear_greed(snapshot.fear_greed_index),
            put_call: interpret_put_call(snapshot.put_call_ratio),
            rsi: classify_rsi(snapshot.rsi),
        }
    }

    /// Count of (buy, sell) hints across the known labels.
    pub fn hint_tally(&self) -> (usize, usize) {
        let hints = [
            self.vix.hint(),
            self.fear_greed.hint(),
            self.put_call.hint(),
            self.rsi.hint(),
        ];
        let buys = hints.iter().filter(|h| **h == Some(TradeHint::Buy)).count();
        let sells = hints.iter().filter(|h| **h == Some(TradeHint::Sell)).count();
        (buys, sells)
    }
}
