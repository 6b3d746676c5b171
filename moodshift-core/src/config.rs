//! TOML configuration.
//!
//! Every section and field has a default, so an empty file (or no file) is a
//! valid configuration tracking QQQ against its 200-day mean.
//!
//! ```toml
//! [reference]
//! symbol = "QQQ"
//! ma_period = 200
//!
//! [allocation]
//! defensive = "SCHD"
//! aggressive = "TQQQ"
//! step_pct = 5
//! cap_pct = 100
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::aggregate::AggregationConfig;
use crate::allocation::ShiftSchedule;
use crate::data::{DataError, PageScraper, ScrapeTarget, YahooChartProvider};

/// Largest accepted `sources.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodShiftConfig {
    pub reference: ReferenceConfig,
    pub rsi: RsiConfig,
    pub volatility: VolatilityConfig,
    pub allocation: AllocationConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub symbol: String,
    pub ma_period: usize,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            symbol: "QQQ".into(),
            ma_period: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    pub symbol: String,
    pub window: usize,
    /// Closes requested for the RSI series.
    pub lookback: usize,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".into(),
            window: 14,
            lookback: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    pub symbol: String,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            symbol: "^VIX".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Display name of the defensive bucket.
    pub defensive: String,
    /// Display name of the aggressive bucket.
    pub aggressive: String,
    pub step_pct: u32,
    pub cap_pct: u32,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        let schedule = ShiftSchedule::default();
        Self {
            defensive: "SCHD".into(),
            aggressive: "TQQQ".into(),
            step_pct: schedule.step_pct,
            cap_pct: schedule.cap_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub fear_greed_url: String,
    pub fear_greed_selector: String,
    pub put_call_url: String,
    pub put_call_selector: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Extra attempts for chart requests after the first.
    pub max_retries: u32,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            fear_greed_url: "https://feargreedmeter.com/".into(),
            fear_greed_selector: "div.text-center.text-4xl.font-semibold.mb-1.text-white".into(),
            put_call_url: "https://ycharts.com/indicators/cboe_equity_put_call_ratio".into(),
            put_call_selector: "td.col-6".into(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0".into(),
            max_retries: 2,
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn chart_provider(&self) -> Result<YahooChartProvider, DataError> {
        YahooChartProvider::new(self.timeout(), &self.user_agent, self.max_retries)
    }

    pub fn page_scraper(&self) -> Result<PageScraper, DataError> {
        PageScraper::new(
            ScrapeTarget::new(&self.fear_greed_url, &self.fear_greed_selector),
            ScrapeTarget::new(&self.put_call_url, &self.put_call_selector),
            self.timeout(),
            &self.user_agent,
        )
    }
}

impl MoodShiftConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("reference.symbol is empty".into()));
        }
        if self.reference.ma_period == 0 {
            return Err(ConfigError::Invalid("reference.ma_period must be >= 1".into()));
        }
        if self.rsi.window == 0 {
            return Err(ConfigError::Invalid("rsi.window must be >= 1".into()));
        }
        if self.rsi.lookback <= self.rsi.window {
            return Err(ConfigError::Invalid(format!(
                "rsi.lookback ({}) must exceed rsi.window ({})",
                self.rsi.lookback, self.rsi.window
            )));
        }
        if self.allocation.step_pct == 0 {
            return Err(ConfigError::Invalid("allocation.step_pct must be >= 1".into()));
        }
        if self.allocation.cap_pct == 0 || self.allocation.cap_pct > 100 {
            return Err(ConfigError::Invalid(format!(
                "allocation.cap_pct must be within 1..=100, got {}",
                self.allocation.cap_pct
            )));
        }
        if self.sources.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "sources.max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
                self.sources.max_retries
            )));
        }
        Ok(())
    }

    pub fn schedule(&self) -> ShiftSchedule {
        ShiftSchedule::new(self.allocation.step_pct, self.allocation.cap_pct)
    }

    pub fn aggregation(&self) -> AggregationConfig {
        AggregationConfig {
            reference_symbol: self.reference.symbol.clone(),
            ma_period: self.reference.ma_period,
            rsi_symbol: self.rsi.symbol.clone(),
            rsi_window: self.rsi.window,
            rsi_lookback: self.rsi.lookback,
            volatility_symbol: self.volatility.symbol.clone(),
        }
    }
}
