//! In-process backend with the same contract as [`PgStore`](super::PgStore).
//!
//! Each account's balance and history sit behind their own async mutex, so
//! mutations of one account serialize while different accounts proceed in
//! parallel. All changes made under that mutex are synchronous, so a call
//! cancelled at an `.await` has either applied completely or not at all.
//!
//! Lock order is always users table, then accounts table, then one ledger.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{
        account::{Account, AccountDetails},
        transaction::{Transaction, TransactionType},
        user::{NewUser, User},
    },
    services::transaction_query::{DateRange, filter_by_range},
    store::BankStore,
};

const EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

impl UserTable {
    fn insert(&mut self, new_user: NewUser) -> Result<User, StoreError> {
        if self.by_email.contains_key(&new_user.email) {
            return Err(StoreError::UniqueViolation {
                constraint: EMAIL_CONSTRAINT.to_string(),
            });
        }

        let user = User {
            id: new_user.id,
            email: new_user.email,
            phone_number: new_user.phone_number,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: Utc::now(),
        };
        self.by_email.insert(user.email.clone(), user.id);
        self.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    fn by_email(&self, email: &str) -> Option<&User> {
        self.by_email.get(email).and_then(|id| self.by_id.get(id))
    }
}

/// One account and its append-only history.
#[derive(Debug)]
struct Ledger {
    account: Account,
    transactions: Vec<Transaction>,
}

impl Ledger {
    fn details(&self, owner: &User) -> AccountDetails {
        AccountDetails {
            id: self.account.id,
            user_id: owner.id,
            balance_cents: self.account.balance_cents,
            email: owner.email.clone(),
            phone_number: owner.phone_number.clone(),
            created_at: self.account.created_at,
        }
    }

    fn append(
        &mut self,
        seq: i64,
        transaction_type: TransactionType,
        amount_cents: i64,
        balance_cents: i64,
    ) -> Transaction {
        let now = Utc::now();
        self.account.balance_cents = balance_cents;
        self.account.updated_at = now;

        let transaction = Transaction {
            id: Uuid::new_v4(),
            seq,
            account_id: self.account.id,
            transaction_type,
            amount_cents,
            balance_cents,
            created_at: now,
        };
        self.transactions.push(transaction.clone());
        transaction
    }
}

/// [`BankStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<UserTable>,
    accounts: RwLock<HashMap<Uuid, Arc<Mutex<Ledger>>>>,
    next_seq: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn ledger(&self, account_id: Uuid) -> Result<Arc<Mutex<Ledger>>, StoreError> {
        self.accounts
            .read()
            .await
            .get(&account_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn next_seq(&self) -> i64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl BankStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.users.write().await.insert(user)
    }

    async fn create_account(
        &self,
        user: NewUser,
        account_id: Uuid,
    ) -> Result<(User, Account), StoreError> {
        let mut users = self.users.write().await;
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&account_id) {
            return Err(StoreError::UniqueViolation {
                constraint: "accounts_pkey".to_string(),
            });
        }

        let user = users.insert(user)?;
        let now = Utc::now();
        let account = Account {
            id: account_id,
            user_id: user.id,
            balance_cents: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };

        accounts.insert(
            account_id,
            Arc::new(Mutex::new(Ledger {
                account: account.clone(),
                transactions: Vec::new(),
            })),
        );

        Ok((user, account))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.by_email(email).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<AccountDetails>, StoreError> {
        let users = self.users.read().await;
        let ledgers: Vec<Arc<Mutex<Ledger>>> =
            self.accounts.read().await.values().cloned().collect();

        let mut accounts = Vec::with_capacity(ledgers.len());
        for ledger in ledgers {
            let ledger = ledger.lock().await;
            if !ledger.account.is_active {
                continue;
            }
            if let Some(owner) = users.by_id.get(&ledger.account.user_id) {
                accounts.push(ledger.details(owner));
            }
        }
        accounts.sort_by_key(|a| (a.created_at, a.id));

        Ok(accounts)
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<AccountDetails>, StoreError> {
        let users = self.users.read().await;
        let ledger = match self.ledger(account_id).await {
            Ok(ledger) => ledger,
            Err(StoreError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        let ledger = ledger.lock().await;

        if !ledger.account.is_active {
            return Ok(None);
        }
        Ok(users
            .by_id
            .get(&ledger.account.user_id)
            .map(|owner| ledger.details(owner)))
    }

    async fn deposit(
        &self,
        account_id: Uuid,
        amount_cents: i64,
    ) -> Result<Transaction, StoreError> {
        let ledger = self.ledger(account_id).await?;
        let mut ledger = ledger.lock().await;

        if !ledger.account.is_active {
            return Err(StoreError::NotFound);
        }

        let new_balance = ledger
            .account
            .balance_cents
            .checked_add(amount_cents)
            .ok_or_else(|| StoreError::Backend("balance out of range".to_string()))?;

        let seq = self.next_seq();
        Ok(ledger.append(seq, TransactionType::Credit, amount_cents, new_balance))
    }

    async fn withdraw(
        &self,
        account_id: Uuid,
        amount_cents: i64,
    ) -> Result<Transaction, StoreError> {
        let ledger = self.ledger(account_id).await?;
        let mut ledger = ledger.lock().await;

        if !ledger.account.is_active {
            return Err(StoreError::NotFound);
        }

        let balance_cents = ledger.account.balance_cents;
        if balance_cents < amount_cents {
            return Err(StoreError::InsufficientFunds {
                balance_cents,
                requested_cents: amount_cents,
            });
        }

        let seq = self.next_seq();
        Ok(ledger.append(
            seq,
            TransactionType::Debit,
            amount_cents,
            balance_cents - amount_cents,
        ))
    }

    async fn list_transactions(
        &self,
        account_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let ledger = self.ledger(account_id).await?;
        let ledger = ledger.lock().await;

        if !ledger.account.is_active {
            return Err(StoreError::NotFound);
        }

        Ok(filter_by_range(
            ledger.transactions.iter().cloned(),
            range.as_ref(),
        ))
    }

    async fn close_account(&self, account_id: Uuid) -> Result<(), StoreError> {
        let ledger = self.ledger(account_id).await?;
        let mut ledger = ledger.lock().await;

        if !ledger.account.is_active {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        ledger.account.is_active = false;
        ledger.account.closed_at = Some(now);
        ledger.account.updated_at = now;

        Ok(())
    }
}
