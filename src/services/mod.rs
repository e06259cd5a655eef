//! Business logic services.
//!
//! Services contain the banking rules separated from HTTP handlers and from
//! storage: authorization, validation, credentials, tokens and date-range
//! filtering.

pub mod bank_service;
pub mod credentials;
pub mod token;
pub mod transaction_query;
