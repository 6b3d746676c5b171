//! Data provider traits and structured error types.
//!
//! Providers return rich `DataError`s so the failure can be logged with its
//! cause. The aggregation layer is the only consumer, and it collapses every
//! error to "unset" before the strategy engine sees anything.

use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider blocked the request (HTTP 403)")]
    Blocked,

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("value not found: {0}")]
    ValueNotFound(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Source of chronological daily closes.
pub trait PriceHistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Up to `lookback` most recent daily closes for `symbol`, oldest first.
    fn closing_prices(&self, symbol: &str, lookback: usize) -> Result<Vec<f64>, DataError>;
}

/// Source of the market-wide sentiment gauges.
pub trait SentimentProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fear & Greed Index, 0..=100.
    fn fear_greed_index(&self) -> Result<u8, DataError>;

    /// Equity put/call ratio.
    fn put_call_ratio(&self) -> Result<f64, DataError>;
}
