use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error taxonomy for the HTTP API.
///
/// Upstream failures (detection API, LLM) never appear here: they are
/// absorbed into fallback values before a handler returns.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request field.
    #[error("{0}")]
    Validation(String),

    /// Signup with an email that is already registered.
    #[error("User with this email already exists")]
    DuplicateEmail,

    /// Missing, invalid or expired token, or bad login credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Entity absent.
    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected. Details are logged, never sent to the client.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            // Kept at 400 (not 409) to match the existing API contract.
            ApiError::DuplicateEmail => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}
