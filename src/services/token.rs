//! Session tokens.
//!
//! A successful login yields an HS256 JWT carrying the user id and role. The
//! auth middleware verifies it on every protected request. The signing key
//! and lifetime come from configuration.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, models::user::Role};

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user id
    pub sub: Uuid,
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issue a token for `user_id` acting as `role`.
    ///
    /// Returns the encoded token and its expiry instant.
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AppError::Internal("token lifetime out of range".to_string()))?;

        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("error generating token: {e}")))?;

        // Round to the second actually encoded in the token
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);

        Ok((token, expires_at))
    }

    /// Verify signature and expiry.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for any malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected session token");
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret", Duration::from_secs(900))
    }

    #[test]
    fn issued_token_verifies_with_identity() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();

        let (token, expires_at) = issuer.issue(user_id, Role::Accountant).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Accountant);
        assert_eq!(claims.exp, expires_at.timestamp());
        assert!(expires_at > Utc::now());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = TokenIssuer::new(b"other", Duration::from_secs(900))
            .issue(Uuid::new_v4(), Role::Customer)
            .unwrap();

        assert!(matches!(issuer().verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::Customer,
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &issuer.encoding).unwrap();

        assert!(matches!(issuer.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            issuer().verify("not.a.token"),
            Err(AppError::Unauthorized)
        ));
    }
}
