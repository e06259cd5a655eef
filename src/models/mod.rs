//! Data models representing database entities and API payloads.

/// Account model
pub mod account;
/// Decimal <-> cents conversion
pub mod money;
/// Ledger entry model
pub mod transaction;
/// User and login models
pub mod user;
