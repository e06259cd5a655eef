//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.
//! Nothing here is global: `main` builds a [`Config`] once and hands the pieces
//! to the constructors that need them.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `JWT_SECRET` (required): symmetric key used to sign session tokens
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `TOKEN_TTL_SECS` (optional): session token lifetime, defaults to 900
/// - `STORE_TIMEOUT_MS` (optional): bound on every storage call, defaults to 5000
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `ACCOUNTANT_EMAIL` / `ACCOUNTANT_PASSWORD` (optional): bootstrap accountant
/// - `PASSWORD_HASH_COST` (optional): bcrypt work factor, defaults to 12
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    pub jwt_secret: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default)]
    pub accountant_email: Option<String>,

    #[serde(default)]
    pub accountant_password: Option<String>,

    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_token_ttl_secs() -> u64 {
    15 * 60
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_max_connections() -> u32 {
    5
}

fn default_password_hash_cost() -> u32 {
    12
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, JWT_SECRET)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Bootstrap accountant credentials, present only when both are set.
    pub fn accountant(&self) -> Option<(&str, &str)> {
        match (&self.accountant_email, &self.accountant_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}
