mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use banking_web_server::{
    error::{AppError, StoreError},
    models::{
        account::{Account, AccountDetails},
        transaction::{Transaction, TransactionQuery, TransactionType},
        user::{LoginRequest, NewUser, Role, User},
    },
    services::transaction_query::DateRange,
    store::{BankStore, MemoryStore},
};
use chrono::Utc;
use rstest::rstest;
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{accountant, customer_request, open_account, service, service_with};

fn amount(units: i64) -> Decimal {
    Decimal::from(units)
}

#[tokio::test]
async fn deposit_withdraw_and_history_scenario() {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "jane@example.com").await;
    let id = created.account_id;

    let credit = bank.deposit(&admin, id, amount(500)).await.unwrap();
    assert_eq!(credit.balance_cents, 50_000);

    let debit = bank.withdraw(&admin, id, amount(200)).await.unwrap();
    assert_eq!(debit.balance_cents, 30_000);

    let err = bank.withdraw(&admin, id, amount(1000)).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds));

    let details = bank.get_account(&admin, id).await.unwrap();
    assert_eq!(details.balance_cents, 30_000);

    let history = bank
        .transactions(&admin, id, &TransactionQuery::default())
        .await
        .unwrap();
    let summary: Vec<_> = history
        .iter()
        .map(|t| (t.transaction_type, t.amount_cents, t.balance_cents))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TransactionType::Credit, 50_000, 50_000),
            (TransactionType::Debit, 20_000, 30_000),
        ]
    );
}

#[tokio::test]
async fn balance_equals_sum_of_signed_amounts() {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "sum@example.com").await;
    let id = created.account_id;

    for cents in [1_000, 250, 75] {
        bank.deposit(&admin, id, Decimal::new(cents, 2)).await.unwrap();
    }
    bank.withdraw(&admin, id, Decimal::new(325, 2)).await.unwrap();
    let _ = bank.withdraw(&admin, id, amount(1_000)).await;

    let history = bank
        .transactions(&admin, id, &TransactionQuery::default())
        .await
        .unwrap();
    let total: i64 = history.iter().map(Transaction::signed_amount_cents).sum();
    let balance = bank.get_account(&admin, id).await.unwrap().balance_cents;

    assert_eq!(balance, total);
    assert_eq!(balance, 1_000);
    assert_eq!(history.last().unwrap().balance_cents, balance);
}

#[tokio::test]
async fn deposit_result_matches_last_history_entry() {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "last@example.com").await;
    let id = created.account_id;

    bank.deposit(&admin, id, amount(40)).await.unwrap();
    let before = bank.get_account(&admin, id).await.unwrap().balance_cents;
    let credit = bank.deposit(&admin, id, Decimal::new(1_050, 2)).await.unwrap();

    let history = bank
        .transactions(&admin, id, &TransactionQuery::default())
        .await
        .unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.id, credit.id);
    assert_eq!(last.balance_cents, before + 1_050);
}

#[tokio::test]
async fn insufficient_funds_changes_nothing() {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "poor@example.com").await;
    let id = created.account_id;
    bank.deposit(&admin, id, amount(10)).await.unwrap();

    let err = bank.withdraw(&admin, id, Decimal::new(1_001, 2)).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds));

    assert_eq!(bank.get_account(&admin, id).await.unwrap().balance_cents, 1_000);
    let history = bank
        .transactions(&admin, id, &TransactionQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn withdrawing_the_exact_balance_leaves_zero() {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "exact@example.com").await;
    let id = created.account_id;
    bank.deposit(&admin, id, amount(75)).await.unwrap();

    let debit = bank.withdraw(&admin, id, amount(75)).await.unwrap();
    assert_eq!(debit.balance_cents, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposit_and_withdraw_serialize() {
    for round in 0..20 {
        let bank = Arc::new(service());
        let admin = accountant();
        let (created, _) = open_account(&bank, &format!("race{round}@example.com")).await;
        let id = created.account_id;
        bank.deposit(&admin, id, amount(100)).await.unwrap();

        let depositor = {
            let bank = Arc::clone(&bank);
            tokio::spawn(async move { bank.deposit(&admin, id, amount(100)).await })
        };
        let withdrawer = {
            let bank = Arc::clone(&bank);
            tokio::spawn(async move { bank.withdraw(&admin, id, amount(100)).await })
        };
        depositor.await.unwrap().unwrap();
        withdrawer.await.unwrap().unwrap();

        let balance = bank.get_account(&admin, id).await.unwrap().balance_cents;
        assert_eq!(balance, 10_000);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw() {
    let bank = Arc::new(service());
    let admin = accountant();
    let (created, _) = open_account(&bank, "drain@example.com").await;
    let id = created.account_id;
    bank.deposit(&admin, id, amount(100)).await.unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let bank = Arc::clone(&bank);
            tokio::spawn(async move { bank.withdraw(&admin, id, amount(30)).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientFunds) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(succeeded, 3);
    let balance = bank.get_account(&admin, id).await.unwrap().balance_cents;
    assert_eq!(balance, 1_000);
}

#[rstest]
#[case(Decimal::ZERO)]
#[case(Decimal::new(-500, 2))]
#[case(Decimal::new(1_001, 3))]
#[tokio::test]
async fn invalid_amounts_are_rejected_before_storage(#[case] value: Decimal) {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "amounts@example.com").await;

    let err = bank
        .deposit(&admin, created.account_id, value)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = bank
        .withdraw(&admin, created.account_id, value)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let bank = service();
    let admin = accountant();
    bank.create_account(&admin, customer_request("dup@example.com"))
        .await
        .unwrap();

    let err = bank
        .create_account(&admin, customer_request("dup@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateAccount));
    assert_eq!(bank.list_accounts(&admin).await.unwrap().len(), 1);
}

#[tokio::test]
async fn new_accounts_start_empty_and_are_listed() {
    let bank = service();
    let admin = accountant();
    let (first, _) = open_account(&bank, "first@example.com").await;
    let (second, _) = open_account(&bank, "second@example.com").await;

    let accounts = bank.list_accounts(&admin).await.unwrap();
    let ids: Vec<Uuid> = accounts.iter().map(|a| a.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.account_id));
    assert!(ids.contains(&second.account_id));
    assert!(accounts.iter().all(|a| a.balance_cents == 0));
}

#[rstest]
#[case(Some("2025-01-10"), None)]
#[case(None, Some("2025-01-10"))]
#[case(Some("2025-01-10"), Some("2025-01-10"))]
#[case(Some("2025-01-10"), Some("2025-01-01"))]
#[case(Some("2025-01-01"), Some("2025-02-15"))]
#[case(Some("01/01/2025"), Some("2025-01-10"))]
#[tokio::test]
async fn invalid_ranges_are_rejected(
    #[case] start: Option<&'static str>,
    #[case] end: Option<&'static str>,
) {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "range@example.com").await;

    let query = TransactionQuery {
        start_date: start.map(str::to_string),
        end_date: end.map(str::to_string),
    };
    let err = bank
        .transactions(&admin, created.account_id, &query)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn range_including_today_returns_todays_entries() {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "today@example.com").await;
    bank.deposit(&admin, created.account_id, amount(5))
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    let query = TransactionQuery {
        start_date: Some((today - chrono::Days::new(7)).format("%Y-%m-%d").to_string()),
        end_date: Some(today.format("%Y-%m-%d").to_string()),
    };
    let history = bank
        .transactions(&admin, created.account_id, &query)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);

    let past = TransactionQuery {
        start_date: Some("2020-01-01".to_string()),
        end_date: Some("2020-01-31".to_string()),
    };
    let history = bank
        .transactions(&admin, created.account_id, &past)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn customers_only_see_their_own_account() {
    let bank = service();
    let (mine, me) = open_account(&bank, "me@example.com").await;
    let (theirs, _) = open_account(&bank, "them@example.com").await;

    bank.deposit(&me, mine.account_id, amount(20)).await.unwrap();
    bank.withdraw(&me, mine.account_id, amount(5)).await.unwrap();
    assert_eq!(
        bank.get_account(&me, mine.account_id).await.unwrap().balance_cents,
        1_500
    );

    let id = theirs.account_id;
    assert!(matches!(
        bank.get_account(&me, id).await.unwrap_err(),
        AppError::AccountNotFound
    ));
    assert!(matches!(
        bank.deposit(&me, id, amount(1)).await.unwrap_err(),
        AppError::AccountNotFound
    ));
    assert!(matches!(
        bank.transactions(&me, id, &TransactionQuery::default())
            .await
            .unwrap_err(),
        AppError::AccountNotFound
    ));
}

#[tokio::test]
async fn customers_cannot_use_accountant_operations() {
    let bank = service();
    let (mine, me) = open_account(&bank, "me@example.com").await;

    assert!(matches!(
        bank.create_account(&me, customer_request("new@example.com"))
            .await
            .unwrap_err(),
        AppError::Unauthorized
    ));
    assert!(matches!(
        bank.list_accounts(&me).await.unwrap_err(),
        AppError::Unauthorized
    ));
    assert!(matches!(
        bank.close_account(&me, mine.account_id).await.unwrap_err(),
        AppError::Unauthorized
    ));
}

#[tokio::test]
async fn closed_accounts_behave_as_missing() {
    let bank = service();
    let admin = accountant();
    let (created, _) = open_account(&bank, "closing@example.com").await;
    let id = created.account_id;
    bank.deposit(&admin, id, amount(10)).await.unwrap();

    bank.close_account(&admin, id).await.unwrap();

    assert!(matches!(
        bank.get_account(&admin, id).await.unwrap_err(),
        AppError::AccountNotFound
    ));
    assert!(matches!(
        bank.withdraw(&admin, id, amount(1)).await.unwrap_err(),
        AppError::AccountNotFound
    ));
    assert!(matches!(
        bank.close_account(&admin, id).await.unwrap_err(),
        AppError::AccountNotFound
    ));
    assert!(bank.list_accounts(&admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let bank = service();
    let admin = accountant();

    assert!(matches!(
        bank.deposit(&admin, Uuid::new_v4(), amount(1))
            .await
            .unwrap_err(),
        AppError::AccountNotFound
    ));
}

#[tokio::test]
async fn login_with_issued_credentials() {
    let bank = service();
    let (created, owner) = open_account(&bank, "login@example.com").await;

    let session = bank
        .login(LoginRequest {
            email: created.email.clone(),
            password: created.password.clone(),
        })
        .await
        .unwrap();
    let claims = bank.tokens().verify(&session.token).unwrap();
    assert_eq!(claims.sub, owner.user_id);
    assert_eq!(claims.role, owner.role);

    let err = bank
        .login(LoginRequest {
            email: created.email,
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn ensure_accountant_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let bank = service_with(store.clone(), Duration::from_secs(5));
    bank.ensure_accountant("boss@bank.test", "pw").await.unwrap();
    bank.ensure_accountant("boss@bank.test", "pw").await.unwrap();

    let session = bank
        .login(LoginRequest {
            email: "boss@bank.test".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();
    let claims = bank.tokens().verify(&session.token).unwrap();
    assert_eq!(claims.role, Role::Accountant);

    let stored = store
        .find_user_by_email("boss@bank.test")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password_hash.starts_with("$2"));

    let err = bank
        .login(LoginRequest {
            email: "boss@bank.test".to_string(),
            password: "pw2".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn accountant_passwords_are_salted() {
    let store = Arc::new(MemoryStore::new());
    let bank = service_with(store.clone(), Duration::from_secs(5));
    bank.ensure_accountant("one@bank.test", "same-password")
        .await
        .unwrap();
    bank.ensure_accountant("two@bank.test", "same-password")
        .await
        .unwrap();

    let one = store.find_user_by_email("one@bank.test").await.unwrap().unwrap();
    let two = store.find_user_by_email("two@bank.test").await.unwrap().unwrap();
    assert_ne!(one.password_hash, two.password_hash);
}

/// Delays balance mutations past the service timeout.
///
/// `delay` stalls before the mutation is applied, `stall_after` after it.
struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
    stall_after: Duration,
}

#[async_trait]
impl BankStore for SlowStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.inner.create_user(user).await
    }

    async fn create_account(
        &self,
        user: NewUser,
        account_id: Uuid,
    ) -> Result<(User, Account), StoreError> {
        self.inner.create_account(user, account_id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn list_accounts(&self) -> Result<Vec<AccountDetails>, StoreError> {
        self.inner.list_accounts().await
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<AccountDetails>, StoreError> {
        self.inner.get_account(account_id).await
    }

    async fn deposit(
        &self,
        account_id: Uuid,
        amount_cents: i64,
    ) -> Result<Transaction, StoreError> {
        tokio::time::sleep(self.delay).await;
        let transaction = self.inner.deposit(account_id, amount_cents).await?;
        tokio::time::sleep(self.stall_after).await;
        Ok(transaction)
    }

    async fn withdraw(
        &self,
        account_id: Uuid,
        amount_cents: i64,
    ) -> Result<Transaction, StoreError> {
        tokio::time::sleep(self.delay).await;
        let transaction = self.inner.withdraw(account_id, amount_cents).await?;
        tokio::time::sleep(self.stall_after).await;
        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        account_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.inner.list_transactions(account_id, range).await
    }

    async fn close_account(&self, account_id: Uuid) -> Result<(), StoreError> {
        self.inner.close_account(account_id).await
    }
}

#[tokio::test]
async fn timed_out_deposit_has_no_effect() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(),
        delay: Duration::from_millis(500),
        stall_after: Duration::ZERO,
    });
    let bank = service_with(store, Duration::from_millis(50));
    let (created, _) = open_account(&bank, "slow@example.com").await;
    let admin = accountant();

    let err = bank
        .deposit(&admin, created.account_id, amount(10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    assert_eq!(
        bank.get_account(&admin, created.account_id)
            .await
            .unwrap()
            .balance_cents,
        0
    );
    let history = bank
        .transactions(&admin, created.account_id, &TransactionQuery::default())
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn timeout_after_apply_reports_internal_and_history_shows_outcome() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(),
        delay: Duration::ZERO,
        stall_after: Duration::from_millis(500),
    });
    let bank = service_with(store, Duration::from_millis(50));
    let (created, _) = open_account(&bank, "stalled@example.com").await;
    let admin = accountant();

    let err = bank
        .deposit(&admin, created.account_id, amount(10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    // The outcome is unknown to the caller; history is the source of truth.
    let history = bank
        .transactions(&admin, created.account_id, &TransactionQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].balance_cents, 1_000);
}
