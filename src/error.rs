//! Request-facing error type. Each variant maps to exactly one HTTP status
//! and the `{"status":"error","reason":...}` body shape the ingress
//! contract requires.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid job_id")]
    InvalidJobId,

    #[error("shutting down")]
    ShuttingDown,

    #[error("invariant violation: result file missing for job {0}")]
    ResultFileMissing(u64),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            AppError::InvalidJobId => (StatusCode::BAD_REQUEST, "Invalid job_id".to_string()),
            AppError::ShuttingDown => (StatusCode::BAD_REQUEST, "shutting down".to_string()),
            AppError::ResultFileMissing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid job_id".to_string())
            }
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        (status, Json(json!({ "status": "error", "reason": reason }))).into_response()
    }
}
