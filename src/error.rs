// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error (persistence failures etc.)
    Internal(String),

    // 400 Bad Request (empty/oversized content, missing report reason)
    Validation(String),

    // 401 Unauthorized (no/invalid principal)
    AuthRequired(String),

    // 403 Forbidden (principal lacks rights over the target resource)
    Forbidden(String),

    // 404 Not Found (comment/notification/video absent or already deleted)
    NotFound(String),

    // 422 Unprocessable Entity (thread structure violations)
    InvalidParent(String),

    // 422 Unprocessable Entity (pin target violations)
    InvalidTarget(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(_) => write!(f, "Internal Server Error"),
            AppError::Validation(msg)
            | AppError::AuthRequired(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidParent(msg)
            | AppError::InvalidTarget(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into the `{success, error}` JSON envelope with the
/// appropriate HTTP status code. Internal detail is logged, never leaked.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthRequired(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidParent(msg) | AppError::InvalidTarget(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg)
            }
        };
        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::Internal`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
