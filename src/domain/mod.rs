//! Core domain types and logic.

pub mod ohlcv;
pub mod series;
pub mod align;
pub mod correlation;
pub mod date_range;
pub mod ticker;
pub mod analysis;
pub mod candles;
pub mod health;
pub mod error;
