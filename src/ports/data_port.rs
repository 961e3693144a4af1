//! Market data access port trait.

use crate::domain::error::MetalcorrError;
use crate::domain::ohlcv::RawHistory;
use chrono::NaiveDate;

/// Blocking access to a daily price history provider.
pub trait MarketDataPort {
    /// Daily rows for `ticker` in `[start, end)`.
    fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawHistory, MetalcorrError>;

    /// Human-readable instrument name, if the provider knows one.
    fn fetch_display_name(&self, ticker: &str) -> Result<Option<String>, MetalcorrError>;
}
