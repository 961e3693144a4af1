//! Yahoo Finance chart API adapter.
//!
//! Blocking client for `/v8/finance/chart/{ticker}`. One request per call,
//! no retries. The chart meta block also carries the instrument's short and
//! long names, which serve display-name lookups.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::error::MetalcorrError;
use crate::domain::ohlcv::{RawHistory, RawSlice};
use crate::ports::data_port::MarketDataPort;
use crate::settings::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ProviderSettings};

#[derive(Debug, Clone, PartialEq)]
pub struct YahooConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl From<&ProviderSettings> for YahooConfig {
    fn from(settings: &ProviderSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            user_agent: settings.user_agent.clone(),
            timeout: settings.timeout,
        }
    }
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct YahooAdapter {
    client: Client,
    base_url: Url,
    /// Display names seen in chart metadata, keyed by requested ticker.
    names: Mutex<HashMap<String, Option<String>>>,
}

impl std::fmt::Debug for YahooAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooAdapter")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    gmtoffset: i32,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Option<Vec<Option<f64>>>,
    #[serde(default)]
    high: Option<Vec<Option<f64>>>,
    #[serde(default)]
    low: Option<Vec<Option<f64>>>,
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
}

fn first_result(ticker: &str, envelope: ChartEnvelope) -> Result<Option<ChartResult>, MetalcorrError> {
    if let Some(err) = envelope.chart.error {
        return match err.code.as_str() {
            "Not Found" => Ok(None),
            _ => Err(MetalcorrError::provider(
                ticker,
                format!("{}: {}", err.code, err.description),
            )),
        };
    }
    Ok(envelope.chart.result.and_then(|r| r.into_iter().next()))
}

/// Convert a chart response into a [`RawHistory`]. A "Not Found" chart or
/// one without rows becomes an empty history.
fn history_from_envelope(ticker: &str, envelope: ChartEnvelope) -> Result<RawHistory, MetalcorrError> {
    let Some(result) = first_result(ticker, envelope)? else {
        return Ok(RawHistory::empty(ticker));
    };

    let offset = FixedOffset::east_opt(result.meta.gmtoffset)
        .ok_or_else(|| MetalcorrError::provider(ticker, "invalid gmtoffset"))?;
    let timestamps = result
        .timestamp
        .iter()
        .map(|&secs| {
            DateTime::from_timestamp(secs, 0)
                .map(|ts| ts.with_timezone(&offset))
                .ok_or_else(|| MetalcorrError::provider(ticker, format!("invalid timestamp {secs}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let slice_ticker = result.meta.symbol.unwrap_or_else(|| ticker.to_string());
    let slices = result
        .indicators
        .quote
        .into_iter()
        .map(|q| RawSlice {
            ticker: Some(slice_ticker.clone()),
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
        })
        .collect();

    Ok(RawHistory {
        symbol: ticker.to_string(),
        timestamps,
        slices,
    })
}

fn meta_name(meta: &ChartMeta) -> Option<String> {
    meta.short_name
        .as_deref()
        .or(meta.long_name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Name carried by a successful chart response; `None` when the envelope is
/// an error or has no result.
fn envelope_name(envelope: &ChartEnvelope) -> Option<String> {
    envelope
        .chart
        .result
        .as_ref()
        .and_then(|r| r.first())
        .and_then(|r| meta_name(&r.meta))
}

fn name_from_envelope(ticker: &str, envelope: ChartEnvelope) -> Result<Option<String>, MetalcorrError> {
    Ok(first_result(ticker, envelope)?.and_then(|r| meta_name(&r.meta)))
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

impl YahooAdapter {
    pub fn new(config: &YahooConfig) -> Result<Self, MetalcorrError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| MetalcorrError::ConfigInvalid {
            section: "provider".into(),
            key: "base_url".into(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MetalcorrError::provider("yahoo", e))?;
        Ok(Self {
            client,
            base_url,
            names: Mutex::new(HashMap::new()),
        })
    }

    fn chart_url(&self, ticker: &str) -> Result<Url, MetalcorrError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MetalcorrError::provider(ticker, "base_url cannot carry a path"))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart"])
            .push(ticker);
        Ok(url)
    }

    fn cached_name(&self, ticker: &str) -> Option<Option<String>> {
        self.names.lock().ok()?.get(ticker).cloned()
    }

    fn remember_name(&self, ticker: &str, name: Option<String>) {
        if let Ok(mut names) = self.names.lock() {
            names.insert(ticker.to_string(), name);
        }
    }

    fn get_chart(&self, ticker: &str, query: &[(&str, String)]) -> Result<ChartEnvelope, MetalcorrError> {
        let url = self.chart_url(ticker)?;
        debug!(ticker, url = %url, "chart request");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| MetalcorrError::provider(ticker, e))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| MetalcorrError::provider(ticker, e))?;

        match serde_json::from_str::<ChartEnvelope>(&body) {
            // Yahoo answers unknown symbols with 404 plus a chart error body.
            Ok(envelope) if status.is_success() || envelope.chart.error.is_some() => Ok(envelope),
            Ok(_) => Err(MetalcorrError::provider(ticker, format!("HTTP {status}"))),
            Err(e) if status.is_success() => Err(MetalcorrError::provider(
                ticker,
                format!("malformed chart response: {e}"),
            )),
            Err(_) => Err(MetalcorrError::provider(ticker, format!("HTTP {status}"))),
        }
    }
}

impl MarketDataPort for YahooAdapter {
    fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawHistory, MetalcorrError> {
        let envelope = self.get_chart(
            ticker,
            &[
                ("period1", unix_midnight(start).to_string()),
                ("period2", unix_midnight(end).to_string()),
                ("interval", "1d".to_string()),
                ("includePrePost", "false".to_string()),
            ],
        )?;
        let name = envelope_name(&envelope);
        let history = history_from_envelope(ticker, envelope)?;
        if !history.is_empty() {
            self.remember_name(ticker, name);
        }
        debug!(ticker, rows = history.timestamps.len(), "chart rows");
        Ok(history)
    }

    /// Served from the last history fetch of `ticker` when there was one,
    /// otherwise a one-day chart request.
    fn fetch_display_name(&self, ticker: &str) -> Result<Option<String>, MetalcorrError> {
        if let Some(name) = self.cached_name(ticker) {
            return Ok(name);
        }
        let envelope = self.get_chart(
            ticker,
            &[("range", "1d".to_string()), ("interval", "1d".to_string())],
        )?;
        let name = name_from_envelope(ticker, envelope)?;
        self.remember_name(ticker, name.clone());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::normalize_history;

    fn envelope(json: &str) -> ChartEnvelope {
        serde_json::from_str(json).unwrap()
    }

    const GOLD: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "GC=F", "gmtoffset": -18000, "shortName": "Gold Feb 25"},
                "timestamp": [1704171600, 1704258000, 1704344400],
                "indicators": {"quote": [{
                    "open": [2070.0, 2075.5, null],
                    "high": [2080.0, 2081.0, null],
                    "low": [2060.0, 2040.0, null],
                    "close": [2073.9, 2041.0, null],
                    "volume": [1200, 900, null]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_rows_in_exchange_time() {
        let raw = history_from_envelope("GC=F", envelope(GOLD)).unwrap();
        let dates: Vec<_> = raw.dates().collect();
        // 1704171600 is 2024-01-02 05:00 UTC, i.e. midnight New York time.
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());

        let series = normalize_history(&raw).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.prices().collect::<Vec<_>>(), vec![2073.9, 2041.0]);
    }

    #[test]
    fn not_found_is_empty_history() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let raw = history_from_envelope("ZZZZ", envelope(json)).unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn other_chart_errors_are_provider_errors() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Bad Request", "description": "Invalid input"}}}"#;
        let err = history_from_envelope("GC=F", envelope(json)).unwrap_err();
        assert_eq!(err.to_string(), "provider error for GC=F: Bad Request: Invalid input");
    }

    #[test]
    fn result_without_rows_is_empty() {
        let json = r#"{"chart": {"result": [{"meta": {"symbol": "TIN.L", "gmtoffset": 0}, "indicators": {"quote": [{}]}}], "error": null}}"#;
        let raw = history_from_envelope("TIN.L", envelope(json)).unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn name_prefers_short_name() {
        assert_eq!(
            name_from_envelope("GC=F", envelope(GOLD)).unwrap(),
            Some("Gold Feb 25".to_string())
        );
        let json = r#"{"chart": {"result": [{"meta": {"longName": "Apple Inc."}}], "error": null}}"#;
        assert_eq!(
            name_from_envelope("AAPL", envelope(json)).unwrap(),
            Some("Apple Inc.".to_string())
        );
    }

    #[test]
    fn chart_url_escapes_ticker() {
        let adapter = YahooAdapter::new(&YahooConfig {
            base_url: "http://localhost:1234/".into(),
            ..YahooConfig::default()
        })
        .unwrap();
        let url = adapter.chart_url("^DJUSST").unwrap();
        assert!(matches!(
            url.path(),
            "/v8/finance/chart/%5EDJUSST" | "/v8/finance/chart/^DJUSST"
        ));
        assert_eq!(
            adapter.chart_url("GC=F").unwrap().as_str(),
            "http://localhost:1234/v8/finance/chart/GC=F"
        );
        assert_eq!(
            adapter.chart_url("../A B/?#").unwrap().path(),
            "/v8/finance/chart/..%2FA%20B%2F%3F%23"
        );
    }

    #[test]
    fn chart_url_keeps_base_path_prefix() {
        let adapter = YahooAdapter::new(&YahooConfig {
            base_url: "http://localhost:1234/proxy/yahoo".into(),
            ..YahooConfig::default()
        })
        .unwrap();
        assert_eq!(
            adapter.chart_url("AAPL").unwrap().path(),
            "/proxy/yahoo/v8/finance/chart/AAPL"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = YahooAdapter::new(&YahooConfig {
            base_url: "not a url".into(),
            ..YahooConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, MetalcorrError::ConfigInvalid { .. }));
    }
}
