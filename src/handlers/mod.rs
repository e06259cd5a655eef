//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, auth context)
//! 2. Delegates to the banking service
//! 3. Returns HTTP response (JSON, status code)

/// Account management endpoints
pub mod accounts;
/// Login endpoint
pub mod auth;
/// Extractors reporting bad input as `AppError`
pub mod extract;
/// Service health endpoint
pub mod health;
/// Deposit, withdraw and history endpoints
pub mod transactions;
