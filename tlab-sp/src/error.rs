//! Error types for tlab-sp

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::scoring::FormatMismatch;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Nothing uploaded yet (404)
    #[error("{0}")]
    NotFound(String),

    /// A worksheet already exists for the token (409)
    #[error("You have already submitted your predictions.")]
    AlreadySubmitted,

    /// Body is not parseable CSV (400)
    #[error("Invalid CSV: {0}")]
    InvalidCsv(#[from] csv::Error),

    /// Upload does not match the answer key (422)
    #[error(transparent)]
    FormatMismatch(#[from] FormatMismatch),

    /// Answer key worksheet not loaded (503)
    #[error("The answer key has not been loaded yet")]
    AnswerKeyMissing,

    /// Answer key already imported (409)
    #[error("The answer key worksheet '{0}' already exists")]
    AnswerKeyExists(String),

    /// Answer key worksheet does not have the trip_id,label layout (500)
    #[error("The answer key is malformed: {0}")]
    MalformedAnswerKey(String),

    /// tlab-common error; storage failures map to 503
    #[error(transparent)]
    Common(#[from] tlab_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::AlreadySubmitted => (StatusCode::CONFLICT, "already_submitted"),
            ApiError::InvalidCsv(_) => (StatusCode::BAD_REQUEST, "invalid_csv"),
            ApiError::FormatMismatch(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "csv_format_mismatch")
            }
            ApiError::AnswerKeyMissing => (StatusCode::SERVICE_UNAVAILABLE, "answer_key_missing"),
            ApiError::AnswerKeyExists(_) => (StatusCode::CONFLICT, "answer_key_exists"),
            ApiError::MalformedAnswerKey(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "malformed_answer_key")
            }
            ApiError::Common(err) if err.is_storage_failure() => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let mut error = json!({
            "code": code,
            "message": self.to_string(),
        });
        if let ApiError::FormatMismatch(mismatch) = &self {
            error["reason"] = json!(mismatch.code());
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
