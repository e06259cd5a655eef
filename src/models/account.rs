//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Database entity representing an account
//! - `AccountDetails`: An account joined with its owner's contact fields
//! - `CreateAccountRequest` / `CreateAccountResponse`: account opening
//! - `AccountResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        money,
        user::{validate_email, validate_phone},
    },
};

/// Represents an account record from the database.
///
/// # Balance Storage
///
/// Balances are stored as `i64` cents to avoid floating-point precision issues.
/// Must be >= 0 (enforced by database CHECK constraint).
///
/// # Lifecycle
///
/// Closing an account clears `is_active` and sets `closed_at`; the row and
/// its transaction history stay in place.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Current balance in cents
    pub balance_cents: i64,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    /// Timestamp of last balance update
    pub updated_at: DateTime<Utc>,

    pub closed_at: Option<DateTime<Utc>>,
}

/// An active account together with its owner's email and phone number.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance_cents: i64,
    pub email: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for opening a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "email": "jane@example.com",
///   "phone_number": "1234567899"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub phone_number: String,
}

impl CreateAccountRequest {
    /// Trims the email, then checks both fields.
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = self.email.trim().to_string();
        if self.email.is_empty() || self.phone_number.is_empty() {
            return Err(AppError::InvalidInput(
                "Email address and phone number must be provided".to_string(),
            ));
        }
        validate_email(&self.email)?;
        validate_phone(&self.phone_number)
    }
}

/// Response body for account opening.
///
/// `password` is the generated credential in plaintext. It is only ever
/// returned here; the server keeps a hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub account_id: Uuid,
    pub email: String,
    pub password: String,
}

/// Response body for account endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_id": "550e8400-e29b-41d4-a716-446655440000",
///   "balance": "300.00",
///   "email": "jane@example.com",
///   "phone_number": "1234567899",
///   "created_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub balance: Decimal,
    pub email: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

/// Convert AccountDetails to API AccountResponse.
///
/// Drops the internal `user_id` and renders the balance as a decimal.
impl From<AccountDetails> for AccountResponse {
    fn from(account: AccountDetails) -> Self {
        Self {
            account_id: account.id,
            balance: money::from_cents(account.balance_cents),
            email: account.email,
            phone_number: account.phone_number,
            created_at: account.created_at,
        }
    }
}
