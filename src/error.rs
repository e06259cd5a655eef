//! Error types and HTTP error response handling.
//!
//! Two layers of errors live here:
//! - [`StoreError`]: what a storage backend reports, classified structurally
//!   (a unique violation is a variant, not a string to be parsed)
//! - [`AppError`]: the small, stable vocabulary the banking service exposes,
//!   and how each variant is turned into an HTTP response

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::error::ErrorKind;

/// Errors reported by a [`BankStore`](crate::store::BankStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The account (or user) does not exist or has been closed.
    #[error("record not found")]
    NotFound,

    /// A withdrawal asked for more than the current balance.
    ///
    /// Raised inside the atomic ledger operation, before anything is written.
    #[error("insufficient funds: balance {balance_cents}, requested {requested_cents}")]
    InsufficientFunds {
        balance_cents: i64,
        requested_cents: i64,
    },

    /// A uniqueness constraint rejected the write.
    ///
    /// `constraint` names the violated constraint when the backend knows it
    /// (e.g. `users_email_key`).
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Any other database failure (connection, query, commit).
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// A backend failure that did not come from the SQL driver.
    #[error("storage error: {0}")]
    Backend(String),
}

/// Classify driver errors by kind instead of by message text.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if matches!(db_err.kind(), ErrorKind::UniqueViolation) {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Application-wide error type.
///
/// Every operation of the banking service fails with one of these variants.
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Resource Errors**: the account or user does not exist
/// - **Conflict Errors**: the email is already registered
/// - **Business Logic Errors**: a withdrawal exceeds the balance
/// - **Authentication Errors**: missing/invalid token, bad credentials, wrong role
/// - **Validation Errors**: malformed request data
/// - **Internal Errors**: storage failures and timeouts
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Requested account does not exist, is closed, or is not visible to the caller.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Account not found")]
    AccountNotFound,

    /// An account already exists for the given email.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Account exists for the given email")]
    DuplicateAccount,

    /// Account has insufficient balance for the requested withdrawal.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Authentication or authorization failed.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("{0}")]
    InvalidInput(String),

    /// Storage failure, timeout, or any unexpected condition.
    ///
    /// Returns HTTP 500 Internal Server Error. The detail is logged, never sent.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AccountNotFound => "account_not_found",
            AppError::DuplicateAccount => "duplicate_account",
            AppError::InsufficientFunds => "insufficient_funds",
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AccountNotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateAccount => StatusCode::CONFLICT,
            AppError::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Malformed request bodies, path segments and query strings are all invalid input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

/// Translate storage errors into the service vocabulary.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::AccountNotFound,
            StoreError::InsufficientFunds { .. } => AppError::InsufficientFunds,
            StoreError::UniqueViolation { .. } => AppError::DuplicateAccount,
            StoreError::Database(e) => AppError::Internal(e.to_string()),
            StoreError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Internal errors hide their detail from the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed with internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}
