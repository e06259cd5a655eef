//! Login endpoint.

use crate::{
    error::AppError,
    handlers::extract::AppJson,
    models::user::{LoginRequest, LoginResponse},
    state::AppState,
};
use axum::{Json, extract::State};

/// Exchange credentials for a session token.
///
/// # Endpoint
///
/// `POST /api/v1/login`
///
/// # Request Body
///
/// ```json
/// { "email": "jane@example.com", "password": "<generated credential>" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{ "token": "...", "expires_at": "..." }`
/// - **Error (400)**: missing or malformed fields
/// - **Error (401)**: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state.bank.login(request).await?;
    Ok(Json(response))
}
