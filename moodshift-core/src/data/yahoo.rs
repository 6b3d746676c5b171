//! Yahoo Finance chart provider.
//!
//! Fetches daily closes from Yahoo's v8 chart API. Handles retries with
//! exponential backoff and response parsing. Yahoo has no official API and
//! changes its format without notice, so every parse step reports
//! `ResponseFormatChanged` instead of panicking.

use super::provider::{DataError, PriceHistoryProvider};
use serde::Deserialize;
use std::time::Duration;

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Upper bound on a single backoff sleep.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

/// Yahoo Finance daily-close provider.
pub struct YahooChartProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooChartProvider {
    pub fn new(timeout: Duration, user_agent: &str, max_retries: u32) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: CHART_BASE_URL.to_string(),
            max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Point the provider at a different chart endpoint (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Smallest chart range covering `lookback` trading days, with slack for
    /// holidays and null sessions.
    fn range_for(lookback: usize) -> &'static str {
        match lookback {
            0..=4 => "5d",
            5..=18 => "1mo",
            19..=58 => "3mo",
            59..=118 => "6mo",
            119..=240 => "1y",
            241..=480 => "2y",
            481..=1200 => "5y",
            _ => "max",
        }
    }

    fn chart_url(&self, symbol: &str, lookback: usize) -> String {
        let encoded = symbol.replace('^', "%5E");
        format!(
            "{}/{encoded}?range={}&interval=1d",
            self.base_url,
            Self::range_for(lookback)
        )
    }

    /// Extract the most recent `lookback` closes, oldest first.
    fn parse_closes(
        symbol: &str,
        resp: ChartResponse,
        lookback: usize,
    ) -> Result<Vec<f64>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        // Null closes mark holidays and halted sessions
        let closes: Vec<f64> = quote
            .close
            .into_iter()
            .flatten()
            .filter(|c| c.is_finite())
            .collect();

        if closes.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let skip = closes.len().saturating_sub(lookback);
        Ok(closes[skip..].to_vec())
    }

    /// Backoff before retry `attempt` (1-based): doubles from `base_delay`,
    /// capped at `MAX_RETRY_DELAY`.
    fn retry_delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    fn fetch_with_retry(&self, symbol: &str, lookback: usize) -> Result<Vec<f64>, DataError> {
        let url = self.chart_url(symbol, lookback);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.retry_delay(attempt);
                tracing::warn!(
                    symbol,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = ?last_error,
                    "retrying chart request"
                );
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        return Err(DataError::Blocked);
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    if !status.is_success() {
                        return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    return Self::parse_closes(symbol, chart, lookback);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl PriceHistoryProvider for YahooChartProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn closing_prices(&self, symbol: &str, lookback: usize) -> Result<Vec<f64>, DataError> {
        self.fetch_with_retry(symbol, lookback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str, lookback: usize) -> Result<Vec<f64>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooChartProvider::parse_closes("QQQ", resp, lookback)
    }

    #[test]
    fn parses_closes_and_skips_nulls() {
        let json = r#"{"chart":{"result":[{"timestamp":[1,2,3,4],
            "indicators":{"quote":[{"close":[100.5,null,101.25,102.0]}]}}],"error":null}}"#;
        assert_eq!(parse(json, 10).unwrap(), vec![100.5, 101.25, 102.0]);
    }

    #[test]
    fn keeps_only_the_trailing_lookback() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[1.0,2.0,3.0,4.0,5.0]}]}}],"error":null}}"#;
        assert_eq!(parse(json, 2).unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(
            parse(json, 10),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn other_error_is_format_change() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid range"}}}"#;
        assert!(matches!(
            parse(json, 10),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn all_null_closes_is_not_found() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[null,null]}]}}],"error":null}}"#;
        assert!(matches!(
            parse(json, 10),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn range_covers_lookback() {
        assert_eq!(YahooChartProvider::range_for(1), "5d");
        assert_eq!(YahooChartProvider::range_for(15), "1mo");
        assert_eq!(YahooChartProvider::range_for(200), "1y");
        assert_eq!(YahooChartProvider::range_for(240), "1y");
        assert_eq!(YahooChartProvider::range_for(252), "2y");
        assert_eq!(YahooChartProvider::range_for(5000), "max");
    }

    #[test]
    fn retry_delay_doubles_then_caps() {
        let provider = YahooChartProvider::new(Duration::from_secs(1), "test", 0).unwrap();
        assert_eq!(provider.retry_delay(1), Duration::from_millis(500));
        assert_eq!(provider.retry_delay(2), Duration::from_secs(1));
        assert_eq!(provider.retry_delay(3), Duration::from_secs(2));
        assert_eq!(provider.retry_delay(20), MAX_RETRY_DELAY);
        assert_eq!(provider.retry_delay(33), MAX_RETRY_DELAY);
        assert_eq!(provider.retry_delay(u32::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn many_retries_against_dead_endpoint_fail_without_panic() {
        let mut provider = YahooChartProvider::new(Duration::from_millis(200), "test", 40)
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        provider.base_delay = Duration::ZERO;
        assert!(matches!(
            provider.closing_prices("QQQ", 200),
            Err(DataError::NetworkUnreachable(_))
        ));
    }

    #[test]
    fn url_encodes_index_symbols() {
        let provider =
            YahooChartProvider::new(Duration::from_secs(1), "test", 0).unwrap();
        let url = provider.chart_url("^VIX", 1);
        assert!(url.ends_with("/%5EVIX?range=5d&interval=1d"), "{url}");
    }
}
