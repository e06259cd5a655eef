//! Transaction HTTP handlers.
//!
//! This module implements the ledger endpoints:
//! - POST /api/v1/accounts/{id}/deposit - Add money to account
//! - POST /api/v1/accounts/{id}/withdraw - Remove money from account
//! - GET /api/v1/accounts/{id}/transactions - Transaction history

use crate::{
    error::AppError,
    handlers::extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthContext,
    models::transaction::{AmountRequest, TransactionQuery, TransactionResponse},
    state::AppState,
};
use axum::{Extension, Json, extract::State};
use uuid::Uuid;

/// Credit an account (add money).
///
/// # Request Body
///
/// ```json
/// { "amount": 500 }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "id": "770e8400-...",
///   "account_id": "550e8400-...",
///   "transaction_type": "credit",
///   "amount": "500.00",
///   "balance": "500.00",
///   "created_at": "2025-12-21T16:00:00Z"
/// }
/// ```
pub async fn deposit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(account_id): AppPath<Uuid>,
    AppJson(request): AppJson<AmountRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = state
        .bank
        .deposit(&auth, account_id, request.amount)
        .await?;

    Ok(Json(transaction.into()))
}

/// Debit an account (remove money).
///
/// # Validation
///
/// - Account must have sufficient balance (422 otherwise)
/// - Account must belong to the caller unless the caller is an accountant
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(account_id): AppPath<Uuid>,
    AppJson(request): AppJson<AmountRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = state
        .bank
        .withdraw(&auth, account_id, request.amount)
        .await?;

    Ok(Json(transaction.into()))
}

/// Transaction history, oldest first.
///
/// # Query Parameters
///
/// - `start_date`, `end_date`: `YYYY-MM-DD`, both or neither; start must be
///   before end and the span at most 30 days. Both days are included.
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(account_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<TransactionQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let transactions = state
        .bank
        .transactions(&auth, account_id, &query)
        .await?;

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}
