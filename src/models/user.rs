//! User data models and login request/response types.
//!
//! Users own accounts (customers) or administer them (accountants). The
//! password is a server-generated credential stored only as a SHA-256 hash.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::AppError;

/// Authorization role carried by every user and every session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Owns exactly one account and may only act on it.
    Customer,
    /// Opens, lists, inspects and closes any account.
    Accountant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Accountant => "accountant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "accountant" => Ok(Role::Accountant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Represents a user record from the database.
///
/// Maps to the `users` table. `email` is unique (constraint `users_email_key`).
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    /// SHA-256 hex digest of the generated credential
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            password_hash: row.try_get("password_hash")?,
            role: role.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: e.into(),
            })?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A user about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: Role,
}

/// Request body for `POST /api/v1/login`.
///
/// ```json
/// { "email": "jane@example.com", "password": "9f86d08188..." }
/// ```
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Both fields must be present and the email well formed.
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = self.email.trim().to_string();
        if self.email.is_empty() || self.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email address and password must be provided".to_string(),
            ));
        }
        validate_email(&self.email)
    }
}

/// Response body for a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Minimal structural email check: `local@domain.tld`, no whitespace.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::InvalidInput("Invalid email address".to_string());

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

/// Phone numbers are exactly ten ASCII digits.
pub fn validate_phone(phone_number: &str) -> Result<(), AppError> {
    if phone_number.len() == 10 && phone_number.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "Invalid phone number, must contain 10 digits".to_string(),
        ))
    }
}
