//! Web server adapter.
//!
//! JSON API over axum: correlation analysis and the metals dashboard feed.
//! Both endpoints are served with and without the `/api` prefix.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::SharedDataPort;
use crate::domain::ticker::TickerTable;
use crate::settings::Settings;

pub struct AppState {
    pub data_port: SharedDataPort,
    pub tickers: TickerTable,
    pub lookback_days: i64,
    pub metals_lookback_days: i64,
}

impl AppState {
    pub fn new(data_port: SharedDataPort, settings: &Settings) -> Self {
        Self {
            data_port,
            tickers: settings.tickers.clone(),
            lookback_days: settings.lookback_days,
            metals_lookback_days: settings.metals_lookback_days,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(handlers::analyze))
        .route("/analyze", post(handlers::analyze))
        .route("/api/metals", get(handlers::metals))
        .route("/metals", get(handlers::metals))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
