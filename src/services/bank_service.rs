//! Banking service - the single entry point for every account operation.
//!
//! This service handles:
//! - Request validation before any storage call
//! - Ownership and role checks
//! - Translation of storage errors into [`AppError`]
//! - A timeout around every storage call
//! - Session token issuance on login
//!
//! # Authorization
//!
//! Accountants may open, list, inspect, credit, debit, query and close any
//! account. Customers may only inspect, credit, debit and query their own.
//! An account owned by someone else is reported as not found, so callers
//! cannot discover other customers' accounts.
//!
//! # Timeouts
//!
//! A storage call that does not finish in time is dropped and reported as
//! `Internal`. Before the commit has been sent, dropping rolls everything
//! back. A deposit or withdrawal whose commit was already in flight may still
//! have been applied, so after a timeout callers check the history before
//! retrying a balance change.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::{AppError, StoreError},
    middleware::auth::AuthContext,
    models::{
        account::{AccountDetails, CreateAccountRequest, CreateAccountResponse},
        money,
        transaction::{Transaction, TransactionQuery},
        user::{LoginRequest, LoginResponse, NewUser, Role},
    },
    services::{
        credentials::{
            DEFAULT_PASSWORD_COST, generate_secret, hash_credential, hash_password,
            verify_credential,
        },
        token::TokenIssuer,
        transaction_query,
    },
    store::BankStore,
};

/// Orchestrates the account directory and the ledger on behalf of callers.
#[derive(Clone)]
pub struct BankService {
    store: Arc<dyn BankStore>,
    tokens: TokenIssuer,
    timeout: Duration,
    password_cost: u32,
}

impl BankService {
    /// # Arguments
    ///
    /// * `store` - storage backend
    /// * `tokens` - session token issuer
    /// * `timeout` - upper bound for each storage call
    pub fn new(store: Arc<dyn BankStore>, tokens: TokenIssuer, timeout: Duration) -> Self {
        Self {
            store,
            tokens,
            timeout,
            password_cost: DEFAULT_PASSWORD_COST,
        }
    }

    /// bcrypt work factor for operator-chosen passwords.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Run one storage call under the configured timeout.
    ///
    /// On timeout the future is dropped. See the module docs for what that
    /// means for a commit already in flight.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "storage call timed out"
                );
                Err(AppError::Internal(format!("{operation} timed out")))
            }
        }
    }

    fn require_accountant(caller: &AuthContext) -> Result<(), AppError> {
        if caller.role == Role::Accountant {
            Ok(())
        } else {
            tracing::warn!(user_id = %caller.user_id, "accountant role required");
            Err(AppError::Unauthorized)
        }
    }

    /// Fetch an active account the caller is allowed to see.
    async fn visible_account(
        &self,
        caller: &AuthContext,
        account_id: Uuid,
    ) -> Result<AccountDetails, AppError> {
        let account = self
            .bounded("get_account", self.store.get_account(account_id))
            .await?
            .ok_or(AppError::AccountNotFound)?;

        if caller.role == Role::Accountant || account.user_id == caller.user_id {
            Ok(account)
        } else {
            tracing::warn!(
                user_id = %caller.user_id,
                %account_id,
                "access to another user's account denied"
            );
            Err(AppError::AccountNotFound)
        }
    }

    /// Storage connectivity check for the health endpoint.
    pub async fn health(&self) -> Result<(), AppError> {
        self.bounded("ping", self.store.ping()).await
    }

    /// Make sure an accountant with this email exists.
    ///
    /// Creates it with the given password when missing; an existing
    /// accountant is left untouched. Fails with `DuplicateAccount` when the
    /// email belongs to a customer.
    pub async fn ensure_accountant(&self, email: &str, password: &str) -> Result<(), AppError> {
        let email = email.trim();
        crate::models::user::validate_email(email)?;
        if password.is_empty() {
            return Err(AppError::InvalidInput(
                "Accountant password must not be empty".to_string(),
            ));
        }

        match self
            .bounded("find_user_by_email", self.store.find_user_by_email(email))
            .await?
        {
            Some(user) if user.role == Role::Accountant => {
                tracing::info!(user_id = %user.id, "accountant already present");
                Ok(())
            }
            Some(_) => Err(AppError::DuplicateAccount),
            None => {
                let password = password.to_string();
                let cost = self.password_cost;
                let password_hash =
                    blocking(move || hash_password(&password, cost)).await??;

                let user = self
                    .bounded(
                        "create_user",
                        self.store.create_user(NewUser {
                            id: Uuid::new_v4(),
                            email: email.to_string(),
                            phone_number: String::new(),
                            password_hash,
                            role: Role::Accountant,
                        }),
                    )
                    .await?;
                tracing::info!(user_id = %user.id, "accountant created");
                Ok(())
            }
        }
    }

    /// Verify credentials and issue a session token.
    pub async fn login(&self, mut request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let user = self
            .bounded(
                "find_user_by_email",
                self.store.find_user_by_email(&request.email),
            )
            .await?;

        let user = match user {
            Some(user) => {
                let stored = user.password_hash.clone();
                let password = request.password;
                let valid = blocking(move || verify_credential(&password, &stored)).await?;
                valid.then_some(user)
            }
            None => None,
        }
        .ok_or_else(|| {
            tracing::warn!("login rejected");
            AppError::Unauthorized
        })?;

        let (token, expires_at) = self.tokens.issue(user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

        Ok(LoginResponse { token, expires_at })
    }

    /// Open an account for a new customer.
    ///
    /// # Process
    ///
    /// 1. Check the caller is an accountant
    /// 2. Validate email and phone number
    /// 3. Generate account id and credential
    /// 4. Insert user and account in one transaction
    ///
    /// The plaintext credential is only ever returned here.
    pub async fn create_account(
        &self,
        caller: &AuthContext,
        mut request: CreateAccountRequest,
    ) -> Result<CreateAccountResponse, AppError> {
        Self::require_accountant(caller)?;
        request.validate()?;

        let password = generate_secret();
        let account_id = Uuid::new_v4();
        let new_user = NewUser {
            id: Uuid::new_v4(),
            email: request.email,
            phone_number: request.phone_number,
            password_hash: hash_credential(&password),
            role: Role::Customer,
        };

        let (user, account) = self
            .bounded(
                "create_account",
                self.store.create_account(new_user, account_id),
            )
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::DuplicateAccount) {
                    tracing::warn!("account exists for the given email");
                }
            })?;

        tracing::info!(
            account_id = %account.id,
            user_id = %user.id,
            "account opened"
        );

        Ok(CreateAccountResponse {
            account_id: account.id,
            email: user.email,
            password,
        })
    }

    /// Every active account. Accountants only.
    pub async fn list_accounts(
        &self,
        caller: &AuthContext,
    ) -> Result<Vec<AccountDetails>, AppError> {
        Self::require_accountant(caller)?;
        self.bounded("list_accounts", self.store.list_accounts())
            .await
    }

    pub async fn get_account(
        &self,
        caller: &AuthContext,
        account_id: Uuid,
    ) -> Result<AccountDetails, AppError> {
        self.visible_account(caller, account_id).await
    }

    /// Credit `amount` to the account. Returns the ledger entry carrying the new balance.
    pub async fn deposit(
        &self,
        caller: &AuthContext,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Transaction, AppError> {
        let amount_cents = money::to_cents(amount)?;
        self.visible_account(caller, account_id).await?;

        let transaction = self
            .bounded("deposit", self.store.deposit(account_id, amount_cents))
            .await?;

        tracing::info!(
            %account_id,
            amount_cents,
            balance_cents = transaction.balance_cents,
            "account credited"
        );
        Ok(transaction)
    }

    /// Debit `amount` from the account.
    ///
    /// `InsufficientFunds` when the balance is too low; nothing changes then.
    pub async fn withdraw(
        &self,
        caller: &AuthContext,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Transaction, AppError> {
        let amount_cents = money::to_cents(amount)?;
        self.visible_account(caller, account_id).await?;

        let transaction = self
            .bounded("withdraw", self.store.withdraw(account_id, amount_cents))
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::InsufficientFunds) {
                    tracing::info!(%account_id, amount_cents, "withdrawal refused: insufficient funds");
                }
            })?;

        tracing::info!(
            %account_id,
            amount_cents,
            balance_cents = transaction.balance_cents,
            "account debited"
        );
        Ok(transaction)
    }

    /// Ledger entries of the account, oldest first, optionally within a date range.
    ///
    /// The range is validated before storage is touched.
    pub async fn transactions(
        &self,
        caller: &AuthContext,
        account_id: Uuid,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, AppError> {
        let range = transaction_query::parse_range(query)?;
        self.visible_account(caller, account_id).await?;

        self.bounded(
            "list_transactions",
            self.store.list_transactions(account_id, range),
        )
        .await
    }

    /// Close an account. Accountants only; history is preserved.
    pub async fn close_account(
        &self,
        caller: &AuthContext,
        account_id: Uuid,
    ) -> Result<(), AppError> {
        Self::require_accountant(caller)?;

        self.bounded("close_account", self.store.close_account(account_id))
            .await?;

        tracing::info!(%account_id, "account closed");
        Ok(())
    }
}

/// Run CPU-heavy credential work off the async worker threads.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("credential task failed: {e}")))
}
