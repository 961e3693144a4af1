#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use metalcorr::domain::error::MetalcorrError;
use metalcorr::domain::ohlcv::{RawHistory, RawSlice};
use metalcorr::ports::data_port::MarketDataPort;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory provider. Ignores the requested range and records every
/// history fetch so tests can assert what was (not) queried.
pub struct MockDataPort {
    pub histories: HashMap<String, RawHistory>,
    pub names: HashMap<String, String>,
    pub errors: HashMap<String, String>,
    pub fetched: Mutex<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            histories: HashMap::new(),
            names: HashMap::new(),
            errors: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_closes(self, ticker: &str, rows: &[(&str, f64)]) -> Self {
        self.with_history(make_history(ticker, rows))
    }

    pub fn with_history(mut self, history: RawHistory) -> Self {
        self.histories.insert(history.symbol.clone(), history);
        self
    }

    pub fn with_name(mut self, ticker: &str, name: &str) -> Self {
        self.names.insert(ticker.to_string(), name.to_string());
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_history(
        &self,
        ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<RawHistory, MetalcorrError> {
        self.fetched.lock().unwrap().push(ticker.to_string());
        if let Some(reason) = self.errors.get(ticker) {
            return Err(MetalcorrError::provider(ticker, reason));
        }
        Ok(self
            .histories
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| RawHistory::empty(ticker)))
    }

    fn fetch_display_name(&self, ticker: &str) -> Result<Option<String>, MetalcorrError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(MetalcorrError::provider(ticker, reason));
        }
        Ok(self.names.get(ticker).cloned())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// US Eastern market-open timestamp for `date`.
pub fn market_open(date: &str) -> DateTime<FixedOffset> {
    let est = FixedOffset::west_opt(5 * 3600).unwrap();
    est.from_local_datetime(&parse_date(date).and_hms_opt(9, 30, 0).unwrap())
        .unwrap()
}

/// Single-slice history whose open, high, low and close all equal the given
/// price. A NaN price becomes a gap.
pub fn make_history(ticker: &str, rows: &[(&str, f64)]) -> RawHistory {
    let column: Vec<Option<f64>> = rows
        .iter()
        .map(|(_, p)| if p.is_nan() { None } else { Some(*p) })
        .collect();
    RawHistory {
        symbol: ticker.to_string(),
        timestamps: rows.iter().map(|(d, _)| market_open(d)).collect(),
        slices: vec![RawSlice {
            ticker: Some(ticker.to_string()),
            open: Some(column.clone()),
            high: Some(column.clone()),
            low: Some(column.clone()),
            close: Some(column),
        }],
    }
}
