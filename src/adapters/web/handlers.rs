//! HTTP request handlers for web adapter.
//!
//! Provider calls block, so each request's work runs on the blocking pool.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Local;
use std::sync::Arc;

use crate::domain::analysis::{AnalysisRequest, AnalysisResult, AnalyzeParams, analyze as run_analysis};
use crate::domain::candles::{MetalsOverview, metals_overview};
use crate::domain::date_range::DateRange;

use super::{AppState, WebError};

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeParams>, JsonRejection>,
) -> Result<Json<AnalysisResult>, WebError> {
    let Json(params) = payload.map_err(|e| WebError::new(e.status(), e.body_text()))?;
    let request = AnalysisRequest::from_params(params, Local::now().date_naive(), state.lookback_days)?;

    let result = tokio::task::spawn_blocking(move || {
        run_analysis(&*state.data_port, &state.tickers, &request)
    })
    .await
    .map_err(|e| WebError::internal(e.to_string()))??;

    Ok(Json(result))
}

pub async fn metals(State(state): State<Arc<AppState>>) -> Result<Json<MetalsOverview>, WebError> {
    let range = DateRange::trailing(Local::now().date_naive(), state.metals_lookback_days);

    let overview = tokio::task::spawn_blocking(move || {
        metals_overview(&*state.data_port, &state.tickers, range)
    })
    .await
    .map_err(|e| WebError::internal(e.to_string()))?;

    Ok(Json(overview))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Not found")
}
