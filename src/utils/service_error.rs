// Shared error taxonomy for the tenancy and payment core
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Token unknown or already rotated away. Deliberately not distinguishable
    /// from "never existed" so a consumed link reads the same as a bogus one.
    #[error("Invalid invitation token")]
    InvalidToken,

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    /// Unique-constraint violation: token collision on generation, or a
    /// duplicate membership insert that raced and lost.
    #[error("Conflict")]
    Conflict,

    /// A derived-value check failed after a write. Always surfaced, never
    /// retried: it means a transaction boundary is wrong somewhere.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Pool error: {0}")]
    PoolError(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServiceError::InvalidToken => (
                StatusCode::GONE,
                "Invitation link is invalid or has already been used".to_string(),
            ),
            ServiceError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            ServiceError::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have access to this resource".to_string(),
            ),
            ServiceError::Conflict => (StatusCode::CONFLICT, "Conflict".to_string()),
            ServiceError::InvariantViolation(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ServiceError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ServiceError::PoolError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

// Conversion from various error types
impl From<diesel::result::Error> for ServiceError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => ServiceError::NotFound,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => ServiceError::Conflict,
            _ => ServiceError::DatabaseError(error.to_string()),
        }
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for ServiceError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        ServiceError::PoolError(error.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}
