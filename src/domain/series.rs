//! Canonical price series and the normalizer that builds them.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::error::MetalcorrError;
use crate::domain::ohlcv::{RawHistory, value_at};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }

    pub fn is_missing(&self) -> bool {
        !self.price.is_finite()
    }
}

/// Closing prices for one symbol.
///
/// Dates are strictly increasing and every price is a real number. The only
/// way to build a `Series` is through [`Series::from_points`], which enforces
/// both.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    symbol: String,
    points: Vec<PricePoint>,
}

impl Series {
    /// Drop missing prices, then sort by date keeping the last point seen for
    /// any repeated date.
    pub fn from_points(symbol: impl Into<String>, points: impl IntoIterator<Item = PricePoint>) -> Self {
        let by_date: BTreeMap<NaiveDate, f64> = points
            .into_iter()
            .filter(|p| !p.is_missing())
            .map(|p| (p.date, p.price))
            .collect();
        Self {
            symbol: symbol.into(),
            points: by_date
                .into_iter()
                .map(|(date, price)| PricePoint { date, price })
                .collect(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].price)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Re-run normalization over this series' own points.
    pub fn normalized(&self) -> Self {
        Self::from_points(self.symbol.clone(), self.points.iter().copied())
    }
}

/// Reduce a raw provider history to the closing-price [`Series`].
///
/// Returns [`MetalcorrError::NoData`] when the history is empty, carries no
/// close column, or has no usable close value at all.
pub fn normalize_history(raw: &RawHistory) -> Result<Series, MetalcorrError> {
    if raw.is_empty() {
        return Err(MetalcorrError::no_data(&raw.symbol));
    }
    let close = raw
        .primary_slice()
        .and_then(|s| s.close.as_ref())
        .ok_or_else(|| MetalcorrError::no_data(&raw.symbol))?;

    let points = raw
        .dates()
        .enumerate()
        .map(|(i, date)| PricePoint::new(date, value_at(Some(close), i)));
    let series = Series::from_points(raw.symbol.clone(), points);

    if series.is_empty() {
        return Err(MetalcorrError::no_data(&raw.symbol));
    }
    Ok(series)
}
