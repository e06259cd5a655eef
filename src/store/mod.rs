//! Storage backends for users, accounts and the ledger.
//!
//! [`BankStore`] is the seam between the banking service and persistence.
//! Two implementations exist:
//! - [`PgStore`]: PostgreSQL through sqlx, used by the server
//! - [`MemoryStore`]: in-process tables with the same contract
//!
//! # Ledger contract
//!
//! `deposit` and `withdraw` are the only operations that change a balance.
//! Each one reads the current balance, writes the new one and appends a
//! transaction as a single all-or-nothing unit, serialized against other
//! mutations of the same account. A failed call leaves no trace.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{
        account::{Account, AccountDetails},
        transaction::Transaction,
        user::{NewUser, User},
    },
    services::transaction_query::DateRange,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait BankStore: Send + Sync {
    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a user that owns no account (accountants).
    ///
    /// `UniqueViolation` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Insert a user and its zero-balance account atomically.
    ///
    /// `UniqueViolation` when the email is taken; nothing is written then.
    async fn create_account(
        &self,
        user: NewUser,
        account_id: Uuid,
    ) -> Result<(User, Account), StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Every active account with its owner's contact fields, oldest first.
    async fn list_accounts(&self) -> Result<Vec<AccountDetails>, StoreError>;

    /// One active account, `None` if missing or closed.
    async fn get_account(&self, account_id: Uuid) -> Result<Option<AccountDetails>, StoreError>;

    /// Credit `amount_cents` (> 0). Returns the recorded transaction,
    /// whose `balance_cents` is the new balance.
    async fn deposit(&self, account_id: Uuid, amount_cents: i64)
    -> Result<Transaction, StoreError>;

    /// Debit `amount_cents` (> 0). `InsufficientFunds` leaves everything unchanged.
    async fn withdraw(
        &self,
        account_id: Uuid,
        amount_cents: i64,
    ) -> Result<Transaction, StoreError>;

    /// History of an active account in insertion order, optionally limited to `range`.
    async fn list_transactions(
        &self,
        account_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Soft delete: the account disappears from every other operation, its
    /// transactions stay.
    async fn close_account(&self, account_id: Uuid) -> Result<(), StoreError>;
}
