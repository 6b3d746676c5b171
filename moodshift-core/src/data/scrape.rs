//! HTML scrapers for the Fear & Greed Index and the equity Put/Call ratio.
//!
//! Neither gauge has a free API, so both are read off public pages with a CSS
//! selector. Selectors live in configuration because the pages change layout.
//! Parsing is split from fetching so it can be tested on inline HTML.

use super::provider::{DataError, SentimentProvider};
use scraper::{Html, Selector};
use std::time::Duration;

/// A page and the CSS selector locating the value on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub url: String,
    pub selector: String,
}

impl ScrapeTarget {
    pub fn new(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
        }
    }
}

fn compile(selector: &str) -> Result<Selector, DataError> {
    Selector::parse(selector).map_err(|_| DataError::InvalidSelector(selector.to_string()))
}

/// Read the Fear & Greed Index from the first element matching `selector`.
///
/// The element text must be a bare integer within 0..=100.
pub fn parse_fear_greed(html: &str, selector: &str) -> Result<u8, DataError> {
    let sel = compile(selector)?;
    let document = Html::parse_document(html);

    let element = document
        .select(&sel)
        .next()
        .ok_or_else(|| DataError::ValueNotFound(format!("no element matches '{selector}'")))?;

    let text = element.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(DataError::ValueNotFound(format!(
            "fear & greed element holds '{text}', not an integer"
        )));
    }

    let value: u32 = text
        .parse()
        .map_err(|_| DataError::OutOfRange(format!("fear & greed index {text}")))?;
    if value > 100 {
        return Err(DataError::OutOfRange(format!("fear & greed index {value}")));
    }
    Ok(value as u8)
}

/// Read the Put/Call ratio: the first element matching `selector` whose text
/// parses as a number once thousands separators are removed.
pub fn parse_put_call(html: &str, selector: &str) -> Result<f64, DataError> {
    let sel = compile(selector)?;
    let document = Html::parse_document(html);

    document
        .select(&sel)
        .filter_map(|el| {
            el.text()
                .collect::<String>()
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
        })
        .find(|v| v.is_finite())
        .ok_or_else(|| DataError::ValueNotFound(format!("no numeric cell matches '{selector}'")))
}

/// Sentiment provider backed by two scraped pages.
pub struct PageScraper {
    client: reqwest::blocking::Client,
    fear_greed: ScrapeTarget,
    put_call: ScrapeTarget,
}

impl PageScraper {
    pub fn new(
        fear_greed: ScrapeTarget,
        put_call: ScrapeTarget,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            fear_greed,
            put_call,
        })
    }

    fn fetch_page(&self, url: &str) -> Result<String, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(DataError::Blocked);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            return Err(DataError::Other(format!("HTTP {status} for {url}")));
        }

        resp.text().map_err(|e| {
            DataError::ResponseFormatChanged(format!("unreadable body from {url}: {e}"))
        })
    }
}

impl SentimentProvider for PageScraper {
    fn name(&self) -> &str {
        "page_scraper"
    }

    fn fear_greed_index(&self) -> Result<u8, DataError> {
        let html = self.fetch_page(&self.fear_greed.url)?;
        parse_fear_greed(&html, &self.fear_greed.selector)
    }

    fn put_call_ratio(&self) -> Result<f64, DataError> {
        let html = self.fetch_page(&self.put_call.url)?;
        parse_put_call(&html, &self.put_call.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FGI_SELECTOR: &str = "div.text-center.text-4xl.font-semibold.mb-1.text-white";

    #[test]
    fn fear_greed_from_matching_div() {
        let html = r#"<html><body>
            <div class="text-center text-sm">Now</div>
            <div class="text-center text-4xl font-semibold mb-1 text-white"> 38 </div>
        </body></html>"#;
        assert_eq!(parse_fear_greed(html, FGI_SELECTOR).unwrap(), 38);
    }

    #[test]
    fn fear_greed_only_reads_first_match() {
        let html = r#"<div class="text-center text-4xl font-semibold mb-1 text-white">n/a</div>
            <div class="text-center text-4xl font-semibold mb-1 text-white">50</div>"#;
        assert!(matches!(
            parse_fear_greed(html, FGI_SELECTOR),
            Err(DataError::ValueNotFound(_))
        ));
    }

    #[test]
    fn fear_greed_rejects_decimal_and_out_of_range() {
        let decimal = r#"<div class="text-center text-4xl font-semibold mb-1 text-white">42.5</div>"#;
        assert!(parse_fear_greed(decimal, FGI_SELECTOR).is_err());

        let big = r#"<div class="text-center text-4xl font-semibold mb-1 text-white">250</div>"#;
        assert!(matches!(
            parse_fear_greed(big, FGI_SELECTOR),
            Err(DataError::OutOfRange(_))
        ));
    }

    #[test]
    fn fear_greed_missing_element() {
        assert!(matches!(
            parse_fear_greed("<p>maintenance</p>", FGI_SELECTOR),
            Err(DataError::ValueNotFound(_))
        ));
    }

    #[test]
    fn put_call_skips_non_numeric_cells() {
        let html = r#"<table><tr>
            <td class="col-6">Last Value</td>
            <td class="col-6">0.72</td>
            <td class="col-6">0.80</td>
        </tr></table>"#;
        assert_eq!(parse_put_call(html, "td.col-6").unwrap(), 0.72);
    }

    #[test]
    fn put_call_strips_thousands_separator() {
        let html = r#"<table><tr><td class="col-6">1,050.5</td></tr></table>"#;
        assert_eq!(parse_put_call(html, "td.col-6").unwrap(), 1050.5);
    }

    #[test]
    fn put_call_without_numbers() {
        let html = r#"<table><tr><td class="col-6">--</td></tr></table>"#;
        assert!(matches!(
            parse_put_call(html, "td.col-6"),
            Err(DataError::ValueNotFound(_))
        ));
    }

    #[test]
    fn invalid_selector_is_reported() {
        assert!(matches!(
            parse_put_call("<td>1</td>", "td[[["),
            Err(DataError::InvalidSelector(_))
        ));
    }
}
