#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use banking_web_server::{
    middleware::auth::AuthContext,
    models::{
        account::{CreateAccountRequest, CreateAccountResponse},
        user::Role,
    },
    services::{bank_service::BankService, token::TokenIssuer},
    store::{BankStore, MemoryStore},
};
use uuid::Uuid;

pub const JWT_SECRET: &[u8] = b"integration-test-secret";
pub const ACCOUNTANT_EMAIL: &str = "accountant@bank.test";
pub const ACCOUNTANT_PASSWORD: &str = "ledger-keeper";
/// Lowest bcrypt cost, keeps tests fast.
pub const TEST_PASSWORD_COST: u32 = 4;

pub fn service_with(store: Arc<dyn BankStore>, timeout: Duration) -> BankService {
    BankService::new(
        store,
        TokenIssuer::new(JWT_SECRET, Duration::from_secs(900)),
        timeout,
    )
    .with_password_cost(TEST_PASSWORD_COST)
}

pub fn service() -> BankService {
    service_with(Arc::new(MemoryStore::new()), Duration::from_secs(5))
}

pub fn accountant() -> AuthContext {
    AuthContext {
        user_id: Uuid::new_v4(),
        role: Role::Accountant,
    }
}

pub fn customer_request(email: &str) -> CreateAccountRequest {
    CreateAccountRequest {
        email: email.to_string(),
        phone_number: "1234567899".to_string(),
    }
}

/// Open an account and return it together with its owner's auth context.
pub async fn open_account(
    bank: &BankService,
    email: &str,
) -> (CreateAccountResponse, AuthContext) {
    let admin = accountant();
    let created = bank
        .create_account(&admin, customer_request(email))
        .await
        .unwrap();
    let details = bank.get_account(&admin, created.account_id).await.unwrap();

    let owner = AuthContext {
        user_id: details.user_id,
        role: Role::Customer,
    };
    (created, owner)
}
