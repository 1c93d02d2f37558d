//! API error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lectern_presenter::PresenterError;
use serde_json::json;
use thiserror::Error;

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error type for consistent error responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));
        (status, body).into_response()
    }
}

impl From<PresenterError> for ApiError {
    fn from(err: PresenterError) -> Self {
        match err {
            PresenterError::InvalidMediaIndex { index, .. } => {
                ApiError::NotFound(format!("media entry not found: {}", index))
            }
            PresenterError::UnsupportedMedia(kind) => {
                ApiError::BadRequest(format!("media cannot be shown on a display: {}", kind))
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
