//! HTTP-facing error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::downstream::DownstreamError;
use crate::orchestrator::OrchestratorError;

/// Errors surfaced to API clients as `{ "error": message }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown service '{0}', expected one of: user-profile, product-catalog, trending")]
    UnknownService(String),

    #[error("unknown behavior '{0}', expected one of: normal, slow, fail")]
    UnknownBehavior(String),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownService(_) | ApiError::UnknownBehavior(_) => StatusCode::BAD_REQUEST,
            ApiError::Orchestrator(_) | ApiError::Downstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
