//! MoodShift Core: sentiment interpreters, indicators and the allocation state machine.
//!
//! This crate contains:
//! - Indicators over close series (RSI, SMA)
//! - Sentiment interpreters mapping VIX, Fear & Greed, Put/Call and RSI to labels
//! - The two-bucket allocation state and the monthly shift engine
//! - Indicator aggregation over fail-closed data providers
//! - Yahoo chart and HTML scraping providers
//! - TOML configuration, JSON state store and JSONL evaluation journal

pub mod aggregate;
pub mod allocation;
pub mod config;
pub mod data;
pub mod domain;
pub mod evaluation;
pub mod indicators;
pub mod sentiment;

pub use aggregate::{reference_price_and_ma, AggregationConfig, IndicatorAggregator};
pub use allocation::{
    update_strategy, AllocationState, EvaluationJournal, InvariantViolation, ShiftSchedule,
    StateStore, StoreError, StrategyAction,
};
pub use config::{ConfigError, MoodShiftConfig};
pub use domain::{CalendarMonth, IndicatorSnapshot};
pub use evaluation::{evaluate, evaluate_with, Evaluation};
pub use sentiment::{
    classify_rsi, interpret_fear_greed, interpret_put_call, interpret_vix, FearGreedLabel,
    PutCallLabel, RsiLabel, SentimentLabel, SentimentReadout, TradeHint, VixLabel,
};
