//! PostgreSQL backend.
//!
//! # Atomicity Guarantees
//!
//! Every balance change happens inside a PostgreSQL transaction: the account
//! row is locked, the balance updated and the ledger entry inserted, then the
//! whole unit commits. Any error (or dropping the future on timeout) drops the
//! sqlx transaction, which rolls it back.
//!
//! Each ledger transaction also sets a local `statement_timeout`, so a stuck
//! statement is cancelled by PostgreSQL and rolled back there rather than only
//! abandoned by the caller.
//!
//! # Concurrency
//!
//! Deposits lock the row through `UPDATE`; withdrawals lock it with
//! `SELECT ... FOR UPDATE` before checking funds. Concurrent mutations of one
//! account therefore serialize, and two withdrawals can never both pass the
//! funds check against the same stale balance. Different accounts lock
//! different rows and never wait on each other.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::StoreError,
    models::{
        account::{Account, AccountDetails},
        transaction::{Transaction, TransactionType},
        user::{NewUser, User},
    },
    services::transaction_query::DateRange,
    store::BankStore,
};

/// [`BankStore`] over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
    statement_timeout: Duration,
}

impl PgStore {
    /// # Arguments
    ///
    /// * `pool` - connection pool
    /// * `statement_timeout` - server-side bound on each ledger statement
    pub fn new(pool: DbPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Apply the statement timeout to the current transaction only.
    async fn limit_statements(&self, conn: &mut PgConnection) -> Result<(), StoreError> {
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(self.statement_timeout.as_millis().to_string())
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Append one ledger entry on the connection holding the account lock.
async fn record_transaction(
    conn: &mut PgConnection,
    account_id: Uuid,
    transaction_type: TransactionType,
    amount_cents: i64,
    balance_cents: i64,
) -> Result<Transaction, StoreError> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            id,
            account_id,
            transaction_type,
            amount_cents,
            balance_cents
        )
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, seq, account_id, transaction_type, amount_cents, balance_cents, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(transaction_type.as_str())
    .bind(amount_cents)
    .bind(balance_cents)
    .fetch_one(conn)
    .await?;

    Ok(transaction)
}

#[async_trait]
impl BankStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, phone_number, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, phone_number, password_hash, role, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_account(
        &self,
        user: NewUser,
        account_id: Uuid,
    ) -> Result<(User, Account), StoreError> {
        let mut tx = self.pool.begin().await?;

        // A duplicate email fails here; dropping `tx` rolls back
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, phone_number, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, phone_number, password_hash, role, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, user_id, balance_cents)
            VALUES ($1, $2, 0)
            RETURNING id, user_id, balance_cents, is_active, created_at, updated_at, closed_at
            "#,
        )
        .bind(account_id)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user, account))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, phone_number, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_accounts(&self) -> Result<Vec<AccountDetails>, StoreError> {
        let accounts = sqlx::query_as::<_, AccountDetails>(
            r#"
            SELECT a.id, a.user_id, a.balance_cents, u.email, u.phone_number, a.created_at
            FROM accounts a
            INNER JOIN users u ON u.id = a.user_id
            WHERE a.is_active
            ORDER BY a.created_at, a.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<AccountDetails>, StoreError> {
        let account = sqlx::query_as::<_, AccountDetails>(
            r#"
            SELECT a.id, a.user_id, a.balance_cents, u.email, u.phone_number, a.created_at
            FROM accounts a
            INNER JOIN users u ON u.id = a.user_id
            WHERE a.id = $1 AND a.is_active
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn deposit(
        &self,
        account_id: Uuid,
        amount_cents: i64,
    ) -> Result<Transaction, StoreError> {
        let mut tx = self.pool.begin().await?;
        self.limit_statements(&mut *tx).await?;

        // UPDATE takes the row lock and yields the new balance in one step
        let new_balance: i64 = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance_cents = balance_cents + $1,
                updated_at = NOW()
            WHERE id = $2 AND is_active
            RETURNING balance_cents
            "#,
        )
        .bind(amount_cents)
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let transaction = record_transaction(
            &mut *tx,
            account_id,
            TransactionType::Credit,
            amount_cents,
            new_balance,
        )
        .await?;

        // Commit all changes atomically
        tx.commit().await?;

        Ok(transaction)
    }

    async fn withdraw(
        &self,
        account_id: Uuid,
        amount_cents: i64,
    ) -> Result<Transaction, StoreError> {
        let mut tx = self.pool.begin().await?;
        self.limit_statements(&mut *tx).await?;

        // Lock account and check balance
        let balance_cents: i64 = sqlx::query_scalar(
            "SELECT balance_cents FROM accounts WHERE id = $1 AND is_active FOR UPDATE",
        )
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        if balance_cents < amount_cents {
            tx.rollback().await?;
            return Err(StoreError::InsufficientFunds {
                balance_cents,
                requested_cents: amount_cents,
            });
        }

        let new_balance: i64 = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance_cents = balance_cents - $1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING balance_cents
            "#,
        )
        .bind(amount_cents)
        .bind(account_id)
        .fetch_one(&mut *tx)
        .await?;

        let transaction = record_transaction(
            &mut *tx,
            account_id,
            TransactionType::Debit,
            amount_cents,
            new_balance,
        )
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        account_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1 AND is_active)",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            return Err(StoreError::NotFound);
        }

        let transactions = match range {
            Some(range) => {
                sqlx::query_as::<_, Transaction>(
                    r#"
                    SELECT id, seq, account_id, transaction_type, amount_cents, balance_cents, created_at
                    FROM transactions
                    WHERE account_id = $1 AND created_at >= $2 AND created_at < $3
                    ORDER BY seq
                    "#,
                )
                .bind(account_id)
                .bind(range.start)
                .bind(range.end_exclusive)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Transaction>(
                    r#"
                    SELECT id, seq, account_id, transaction_type, amount_cents, balance_cents, created_at
                    FROM transactions
                    WHERE account_id = $1
                    ORDER BY seq
                    "#,
                )
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(transactions)
    }

    async fn close_account(&self, account_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET is_active = false,
                closed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}
