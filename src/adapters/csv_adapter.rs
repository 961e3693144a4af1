//! CSV directory data adapter.
//!
//! Reads `<ticker>.csv` files with a `date,open,high,low,close[,volume]`
//! header. Blank cells are gaps. An optional `names.csv` (`ticker,name`)
//! supplies display names.

use crate::domain::error::MetalcorrError;
use crate::domain::ohlcv::{RawColumn, RawHistory, RawSlice};
use crate::ports::data_port::MarketDataPort;
use chrono::{NaiveDate, NaiveTime};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<base>/<ticker>.csv`. The ticker must be a single plain file name so
    /// lookups stay inside the data directory.
    fn csv_path(&self, ticker: &str) -> Result<PathBuf, MetalcorrError> {
        let file_name = format!("{}.csv", ticker);
        let mut components = Path::new(&file_name).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain || ticker.is_empty() || ticker.contains(['/', '\\']) || ticker.contains("..") {
            return Err(MetalcorrError::provider(ticker, "invalid ticker for CSV lookup"));
        }
        Ok(self.base_path.join(file_name))
    }

    fn names_path(&self) -> PathBuf {
        self.base_path.join("names.csv")
    }
}

fn parse_cell(
    ticker: &str,
    record: &csv::StringRecord,
    index: usize,
    column: &str,
) -> Result<Option<f64>, MetalcorrError> {
    match record.get(index).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|e| MetalcorrError::provider(ticker, format!("invalid {} value: {}", column, e))),
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawHistory, MetalcorrError> {
        let path = self.csv_path(ticker)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            MetalcorrError::provider(ticker, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut timestamps = Vec::new();
        let (mut open, mut high, mut low, mut close): (RawColumn, RawColumn, RawColumn, RawColumn) =
            Default::default();

        for result in rdr.records() {
            let record = result
                .map_err(|e| MetalcorrError::provider(ticker, format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| MetalcorrError::provider(ticker, "missing date column"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                MetalcorrError::provider(ticker, format!("invalid date format: {}", e))
            })?;

            if date < start || date >= end {
                continue;
            }

            timestamps.push(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
            open.push(parse_cell(ticker, &record, 1, "open")?);
            high.push(parse_cell(ticker, &record, 2, "high")?);
            low.push(parse_cell(ticker, &record, 3, "low")?);
            close.push(parse_cell(ticker, &record, 4, "close")?);
        }

        Ok(RawHistory {
            symbol: ticker.to_string(),
            timestamps,
            slices: vec![RawSlice {
                ticker: Some(ticker.to_string()),
                open: Some(open),
                high: Some(high),
                low: Some(low),
                close: Some(close),
            }],
        })
    }

    fn fetch_display_name(&self, ticker: &str) -> Result<Option<String>, MetalcorrError> {
        let path = self.names_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        for result in rdr.records() {
            let record = result
                .map_err(|e| MetalcorrError::provider(ticker, format!("CSV parse error: {}", e)))?;
            if record.get(0).map(str::trim) == Some(ticker) {
                return Ok(record.get(1).map(|n| n.trim().to_string()));
            }
        }
        Ok(None)
    }
}
