//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `Transaction`: Database entity representing one ledger entry
//! - `AmountRequest`: Request body for deposit and withdraw
//! - `TransactionQuery`: Query string for history lookups
//! - `TransactionResponse`: Response body returned to clients

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::money;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money added to the account
    Credit,
    /// Money removed from the account
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Each transaction:
/// - Belongs to exactly one account
/// - Stores amount and resulting balance in cents (never floats!)
/// - Is immutable once written
///
/// `seq` is assigned at insert time, after the account row lock is held, so
/// ordering by it matches the order in which balances were applied.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub seq: i64,
    pub account_id: Uuid,
    pub transaction_type: TransactionType,

    /// Must be positive (enforced by CHECK constraint)
    pub amount_cents: i64,

    /// Account balance right after this entry was applied
    pub balance_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the sign of its effect on the balance.
    pub fn signed_amount_cents(&self) -> i64 {
        match self.transaction_type {
            TransactionType::Credit => self.amount_cents,
            TransactionType::Debit => -self.amount_cents,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Transaction {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let transaction_type: String = row.try_get("transaction_type")?;
        Ok(Transaction {
            id: row.try_get("id")?,
            seq: row.try_get("seq")?,
            account_id: row.try_get("account_id")?,
            transaction_type: transaction_type.parse().map_err(|e: String| {
                sqlx::Error::ColumnDecode {
                    index: "transaction_type".to_string(),
                    source: e.into(),
                }
            })?,
            amount_cents: row.try_get("amount_cents")?,
            balance_cents: row.try_get("balance_cents")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Request body for deposit and withdraw.
///
/// # JSON Example
///
/// ```json
/// { "amount": 250.75 }
/// ```
///
/// The amount may be a JSON number or a string; it must be positive with at
/// most two decimal places.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

/// Query string for `GET /api/v1/accounts/{id}/transactions`.
///
/// Both dates are `YYYY-MM-DD`. Omit both for the full history.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Response returned for ledger entries.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "account_id": "550e8400-e29b-41d4-a716-446655440000",
///   "transaction_type": "credit",
///   "amount": "500.00",
///   "balance": "500.00",
///   "created_at": "2025-12-21T16:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Convert database Transaction to API TransactionResponse.
///
/// Drops the internal `seq` and renders cents as decimals.
impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            account_id: transaction.account_id,
            transaction_type: transaction.transaction_type,
            amount: money::from_cents(transaction.amount_cents),
            balance: money::from_cents(transaction.balance_cents),
            created_at: transaction.created_at,
        }
    }
}
