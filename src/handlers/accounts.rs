//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /api/v1/accounts - Open new account (accountant)
//! - GET /api/v1/accounts - List all accounts (accountant)
//! - GET /api/v1/accounts/{id} - Get account by ID (owner or accountant)
//! - DELETE /api/v1/accounts/{id} - Close account (accountant)

use crate::{
    error::AppError,
    handlers::extract::{AppJson, AppPath},
    middleware::auth::AuthContext,
    models::account::{AccountResponse, CreateAccountRequest, CreateAccountResponse},
    state::AppState,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

/// Open a new account.
///
/// # Endpoint
///
/// `POST /api/v1/accounts`
///
/// # Request Body
///
/// ```json
/// {
///   "email": "jane@example.com",
///   "phone_number": "1234567899"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: account id, email and the generated password
/// - **Error (400)**: invalid email or phone number
/// - **Error (401)**: missing token or caller is not an accountant
/// - **Error (409)**: email already registered
///
/// ```json
/// {
///   "account_id": "550e8400-e29b-41d4-a716-446655440000",
///   "email": "jane@example.com",
///   "password": "9f86d081884c7d659a2feaa0c55ad015..."
/// }
/// ```
pub async fn create_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(request): AppJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), AppError> {
    let created = state.bank.create_account(&auth, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List all open accounts.
///
/// # Endpoint
///
/// `GET /api/v1/accounts`
///
/// # Ordering
///
/// Accounts are returned oldest first.
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = state.bank.list_accounts(&auth).await?;

    let responses: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}

/// Get a specific account by ID.
///
/// # Security Note
///
/// Returns 404 if the account doesn't exist OR belongs to another customer,
/// so account ids cannot be enumerated.
pub async fn get_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(account_id): AppPath<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state.bank.get_account(&auth, account_id).await?;
    Ok(Json(account.into()))
}

/// Close an account.
///
/// # Response
///
/// Returns 204 No Content on success.
///
/// # Process
///
/// Marks the account inactive to preserve transaction history. The account
/// no longer appears in listings and rejects every operation.
pub async fn close_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(account_id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.bank.close_account(&auth, account_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
