//! Banking Service
//!
//! A REST API for opening customer accounts, moving money in and out of them
//! and reading their transaction history.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries), behind the [`store::BankStore`] trait
//! - **Authentication**: HS256 session tokens issued at login
//! - **Format**: JSON requests/responses
//!
//! Requests flow handler → [`services::bank_service::BankService`] → store.
//! Balance changes happen only inside the store's atomic deposit/withdraw.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
