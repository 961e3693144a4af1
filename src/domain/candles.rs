//! OHLC candle series for the metals dashboard.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, warn};

use crate::domain::date_range::DateRange;
use crate::domain::ohlcv::RawHistory;
use crate::domain::ticker::TickerTable;
use crate::ports::data_port::MarketDataPort;

/// One chart candle: `y` is `[open, high, low, close]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Candle {
    pub x: NaiveDate,
    pub y: [f64; 4],
}

/// Candles from the primary slice, skipping rows without an open or close.
pub fn candles_from_history(raw: &RawHistory) -> Vec<Candle> {
    let by_date: BTreeMap<NaiveDate, Candle> = raw
        .bars()
        .into_iter()
        .filter(|bar| bar.has_open_and_close())
        .map(|bar| {
            (
                bar.date,
                Candle {
                    x: bar.date,
                    y: [bar.open, bar.high, bar.low, bar.close],
                },
            )
        })
        .collect();
    by_date.into_values().collect()
}

/// Name → candles, in ticker-table order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetalsOverview(pub Vec<(String, Vec<Candle>)>);

impl MetalsOverview {
    pub fn get(&self, name: &str) -> Option<&[Candle]> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MetalsOverview {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, candles) in &self.0 {
            map.serialize_entry(name, candles)?;
        }
        map.end()
    }
}

/// Fetch candles for every metal and steel entry. A failed fetch yields an
/// empty list for that name.
pub fn metals_overview(
    port: &dyn MarketDataPort,
    tickers: &TickerTable,
    range: DateRange,
) -> MetalsOverview {
    let entries = tickers
        .all()
        .map(|(name, ticker)| {
            let candles = match port.fetch_history(ticker, range.start, range.end) {
                Ok(raw) => candles_from_history(&raw),
                Err(e) => {
                    warn!(metal = name, ticker, error = %e, "metal fetch failed");
                    Vec::new()
                }
            };
            debug!(metal = name, ticker, candles = candles.len(), "metal candles");
            (name.to_string(), candles)
        })
        .collect();
    MetalsOverview(entries)
}
