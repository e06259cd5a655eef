//! Banking Service - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Bootstrap the configured accountant, if any
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

use std::sync::Arc;

use banking_web_server::{
    config, db, routes,
    services::{bank_service::BankService, token::TokenIssuer},
    state::AppState,
    store::PgStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(
        &config.database_url,
        config.db_max_connections,
        config.store_timeout(),
    )
    .await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let bank = BankService::new(
        Arc::new(PgStore::new(pool, config.store_timeout())),
        TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl()),
        config.store_timeout(),
    )
    .with_password_cost(config.password_hash_cost);

    if let Some((email, password)) = config.accountant() {
        bank.ensure_accountant(email, password).await?;
    }

    let app = routes::router(AppState::new(bank));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
