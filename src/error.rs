use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

use crate::password::PasswordError;

/// Failure while preparing the database. Fatal: the process must not serve.
#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("Database error during initialization: {0}")]
    Database(#[from] SqlxError),

    #[error("Foreign key enforcement is disabled on this connection")]
    ForeignKeysDisabled,

    #[error("Failed to hash seed password: {0}")]
    Seed(#[from] PasswordError),
}

/// Failure of a customer store operation. All variants are recoverable.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("A customer with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Database error: {0}")]
    Connectivity(#[from] SqlxError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl StoreError {
    /// Map an insert failure, turning a unique violation into `DuplicateEmail`.
    pub(crate) fn from_insert(err: SqlxError, email: &str) -> Self {
        if let SqlxError::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return StoreError::DuplicateEmail(email.to_string());
        }
        StoreError::Connectivity(err)
    }
}

#[derive(Debug, ThisError)]
pub enum QualimedError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid cookie key: {0}")]
    CookieKey(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not signed in")]
    Unauthenticated,
}

impl From<figment::Error> for QualimedError {
    fn from(e: figment::Error) -> Self {
        QualimedError::Config(Box::new(e))
    }
}

impl IntoResponse for QualimedError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            QualimedError::Store(StoreError::DuplicateEmail(_)) => (
                StatusCode::CONFLICT,
                "DUPLICATE_EMAIL",
                "An account with this email already exists.".to_string(),
            ),
            QualimedError::Store(_) | QualimedError::Schema(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "The store is temporarily unavailable; please retry.".to_string(),
            ),
            QualimedError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            QualimedError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password.".to_string(),
            ),
            QualimedError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Sign in required.".to_string(),
            ),
            QualimedError::Config(_) | QualimedError::CookieKey(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
        };
        let body = ApiErrorResponse {
            error: ApiErrorBody {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
