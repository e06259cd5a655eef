//! Login credentials.
//!
//! Customers never choose a password: one is generated when the account is
//! opened, shown once, and only its SHA-256 digest is stored. Accountant
//! passwords are chosen by an operator and are stored as salted bcrypt hashes.
//! [`verify_credential`] tells the two apart by the stored format.

use sha2::{Digest, Sha256};

use crate::error::AppError;

/// bcrypt work factor used unless configured otherwise.
pub const DEFAULT_PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;

/// Generate cryptographically secure random credential.
///
/// # Output
///
/// 64 hex characters (32 random bytes)
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Hex-encoded SHA-256 digest of a generated credential.
pub fn hash_credential(credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted bcrypt hash of an operator-chosen password.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(format!("error hashing password: {e}")))
}

/// Check a presented credential against what is stored in `users.password_hash`.
///
/// bcrypt hashes start with `$2`; anything else is a SHA-256 hex digest.
pub fn verify_credential(presented: &str, stored: &str) -> bool {
    if stored.starts_with("$2") {
        bcrypt::verify(presented, stored).unwrap_or(false)
    } else {
        hash_credential(presented) == stored
    }
}
