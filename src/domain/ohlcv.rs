//! Raw provider history and flattened OHLC bars.
//!
//! A provider answers a history query with a [`RawHistory`]: one timestamp
//! axis plus one or more [`RawSlice`]s. A plain single-symbol query yields one
//! slice; batch-style answers carry several, each tagged with its ticker.
//! Nothing downstream of the normalizer looks at this shape.

use chrono::{DateTime, FixedOffset, NaiveDate};

/// One price column; `None` entries are gaps reported by the provider.
pub type RawColumn = Vec<Option<f64>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSlice {
    pub ticker: Option<String>,
    pub open: Option<RawColumn>,
    pub high: Option<RawColumn>,
    pub low: Option<RawColumn>,
    pub close: Option<RawColumn>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHistory {
    pub symbol: String,
    pub timestamps: Vec<DateTime<FixedOffset>>,
    pub slices: Vec<RawSlice>,
}

impl RawHistory {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() || self.slices.is_empty()
    }

    /// The slice tagged with this history's symbol, else the first one.
    pub fn primary_slice(&self) -> Option<&RawSlice> {
        self.slices
            .iter()
            .find(|s| {
                s.ticker
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(&self.symbol))
            })
            .or_else(|| self.slices.first())
    }

    /// Calendar date of each row in the exchange's local time, offset dropped.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.timestamps.iter().map(|ts| ts.naive_local().date())
    }

    /// Flatten the primary slice into bars. Gaps become NaN.
    pub fn bars(&self) -> Vec<OhlcvBar> {
        let Some(slice) = self.primary_slice() else {
            return Vec::new();
        };
        self.dates()
            .enumerate()
            .map(|(i, date)| OhlcvBar {
                date,
                open: value_at(slice.open.as_ref(), i),
                high: value_at(slice.high.as_ref(), i),
                low: value_at(slice.low.as_ref(), i),
                close: value_at(slice.close.as_ref(), i),
            })
            .collect()
    }
}

pub(crate) fn value_at(column: Option<&RawColumn>, index: usize) -> f64 {
    column
        .and_then(|c| c.get(index).copied().flatten())
        .unwrap_or(f64::NAN)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcvBar {
    pub fn has_open_and_close(&self) -> bool {
        self.open.is_finite() && self.close.is_finite()
    }
}
