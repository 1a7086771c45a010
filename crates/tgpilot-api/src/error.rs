//! API error types.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use tgpilot_runtime::WorkflowError;

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error type for consistent error responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input, or a rejected login code or password.
    #[error("{0}")]
    BadRequest(String),

    /// No authenticated session for the request.
    #[error("{0}")]
    Unauthorized(String),

    /// Anything else.
    #[error("{message}")]
    Internal {
        /// Short description.
        message: String,
        /// Underlying cause.
        details: String,
    },
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds an internal error.
    pub fn internal(message: impl Into<String>, details: impl ToString) -> Self {
        ApiError::Internal {
            message: message.into(),
            details: details.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Internal { message, details } => {
                error!(error = %message, details = %details, "request failed");
                json!({
                    "success": false,
                    "error": message,
                    "details": details,
                })
            }
            other => json!({
                "success": false,
                "error": other.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::InvalidInput(msg) => ApiError::BadRequest(msg),
            WorkflowError::NotConnected => {
                ApiError::Unauthorized("Not connected. Please connect first.".to_string())
            }
            WorkflowError::InvalidCode => {
                ApiError::BadRequest("Invalid verification code".to_string())
            }
            WorkflowError::InvalidPassword => {
                ApiError::BadRequest("Invalid two-step verification password".to_string())
            }
            WorkflowError::ConnectFailed(reason) => ApiError::internal("Failed to connect", reason),
            err @ WorkflowError::Timeout(_) => ApiError::internal("Remote call timed out", err),
            WorkflowError::Upstream(e) => ApiError::internal("Upstream request failed", e),
        }
    }
}
