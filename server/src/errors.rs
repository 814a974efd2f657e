use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use memo_core::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::mail::MailError;

/// Fatal startup errors
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Missing environment variable {1}: {0}")]
    EnvError(std::env::VarError, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot serve the application: {0}")]
    CannotServe(std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authentication failures, all answered with 401
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    TokenNotFound,

    #[error("Token has expired.")]
    TokenExpired,

    #[error("Invalid token, request a new one.")]
    TokenMalformed,

    #[error("Invalid token signature.")]
    InvalidSignature,

    #[error("Invalid credentials provided")]
    InvalidCredentials,
}

/// Errors crossing the HTTP boundary. Every variant renders as a structured
/// `{"detail": ...}` body; raw store or transport errors never leak through.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Authorization(#[from] AuthError),

    #[error("Record not found.")]
    NotFound,

    #[error("This account already exists.")]
    DuplicateEmail,

    #[error("A note with this slug already exists.")]
    DuplicateSlug,

    #[error("Failed to deliver email to recipients: {0}")]
    Delivery(String),

    #[error("Failed to render export: {0}")]
    Render(String),

    #[error("Internal server error")]
    Internal(String),
}

pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            RestError::Validation(_) => StatusCode::BAD_REQUEST,
            RestError::Authorization(_) => StatusCode::UNAUTHORIZED,
            RestError::NotFound => StatusCode::NOT_FOUND,
            RestError::DuplicateEmail => StatusCode::FORBIDDEN,
            RestError::DuplicateSlug => StatusCode::CONFLICT,
            RestError::Delivery(_) => StatusCode::BAD_GATEWAY,
            RestError::Render(_) | RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Lets fallible handlers appear in generated docs; the per-endpoint
// responses are declared in the route transform functions.
impl aide::OperationOutput for RestError {
    type Inner = Self;
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        if let RestError::Internal(detail) = &self {
            tracing::error!(detail, "internal server error");
        }

        let body = Json(json!({ "detail": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => RestError::DuplicateEmail,
            StoreError::DuplicateSlug => RestError::DuplicateSlug,
            StoreError::NotFound => RestError::NotFound,
            StoreError::InvalidFilter(detail) => RestError::Validation(detail),
            StoreError::Sqlite(e) => RestError::Internal(e.to_string()),
        }
    }
}

impl From<MailError> for RestError {
    fn from(err: MailError) -> Self {
        RestError::Delivery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_store_errors_map_to_statuses() {
        assert_eq!(
            RestError::from(StoreError::DuplicateEmail).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            RestError::from(StoreError::DuplicateSlug).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            RestError::from(StoreError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RestError::from(StoreError::InvalidFilter("bad".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = RestError::Internal("connection lost".into());
        assert_eq!(err.to_string(), "Internal server error");
    }
}
