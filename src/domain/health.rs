//! Sanity classification of a fetched history, for ticker diagnostics.

use std::fmt;

use crate::domain::ohlcv::RawHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Empty,
    AllZeros,
    AllNans,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "OK",
            Self::Empty => "EMPTY",
            Self::AllZeros => "ALL ZEROS",
            Self::AllNans => "ALL NANS",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesHealth {
    pub rows: usize,
    /// Close on the last row, NaN when that row has none.
    pub latest: f64,
    /// Mean over the closes that are present.
    pub mean: f64,
    pub status: HealthStatus,
}

impl SeriesHealth {
    pub fn of(raw: &RawHistory) -> Self {
        let bars = raw.bars();
        if bars.is_empty() {
            return Self {
                rows: 0,
                latest: f64::NAN,
                mean: f64::NAN,
                status: HealthStatus::Empty,
            };
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).filter(|c| c.is_finite()).collect();
        let mean = if closes.is_empty() {
            f64::NAN
        } else {
            closes.iter().sum::<f64>() / closes.len() as f64
        };
        let latest = bars.last().map_or(f64::NAN, |b| b.close);

        let status = if mean.is_nan() {
            HealthStatus::AllNans
        } else if mean == 0.0 || closes.iter().all(|&c| c == 0.0) {
            HealthStatus::AllZeros
        } else {
            HealthStatus::Ok
        };

        Self {
            rows: bars.len(),
            latest,
            mean,
            status,
        }
    }
}
