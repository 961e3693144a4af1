//! HTTP error responses for web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::domain::error::MetalcorrError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &MetalcorrError) -> StatusCode {
    match err {
        MetalcorrError::MissingStockIds
        | MetalcorrError::InvalidDate { .. }
        | MetalcorrError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
        MetalcorrError::MetalNotFound { .. } | MetalcorrError::NoData { .. } => {
            StatusCode::NOT_FOUND
        }
        MetalcorrError::Provider { .. } => StatusCode::BAD_GATEWAY,
        MetalcorrError::ConfigParse { .. }
        | MetalcorrError::ConfigMissing { .. }
        | MetalcorrError::ConfigInvalid { .. }
        | MetalcorrError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<MetalcorrError> for WebError {
    fn from(err: MetalcorrError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        }
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}
