//! Query windows for history requests.

use chrono::{Days, NaiveDate};

use crate::domain::error::MetalcorrError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A `[start, end)` window; providers treat `end` as exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, MetalcorrError> {
        if start > end {
            return Err(MetalcorrError::InvalidRange {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// `[today - days, today]`, clamped to the earliest representable date.
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        let back = Days::new(days.max(0).unsigned_abs());
        Self {
            start: today.checked_sub_days(back).unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    /// Explicit bounds when both are given, else the trailing window.
    ///
    /// Blank strings count as absent.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
        lookback_days: i64,
    ) -> Result<Self, MetalcorrError> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());
        match (start, end) {
            (Some(start), Some(end)) => {
                Self::new(parse_date("start_date", start)?, parse_date("end_date", end)?)
            }
            _ => Ok(Self::trailing(today, lookback_days)),
        }
    }
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, MetalcorrError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| MetalcorrError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}
