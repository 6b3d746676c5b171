//! Market and sentiment data collaborators.
//!
//! - `provider`: the traits the aggregation layer consumes, plus `DataError`
//! - `yahoo`: daily closes from Yahoo's v8 chart API
//! - `scrape`: Fear & Greed and Put/Call readings scraped from public pages

pub mod provider;
pub mod scrape;
pub mod yahoo;

pub use provider::{DataError, PriceHistoryProvider, SentimentProvider};
pub use scrape::{parse_fear_greed, parse_put_call, PageScraper, ScrapeTarget};
pub use yahoo::YahooChartProvider;
