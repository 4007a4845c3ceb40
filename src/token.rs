//! Signed, time-limited identity tokens (HS256 JWT).

use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of tokens issued at login.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Token payload. Claim names match what existing clients already decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "user_id")]
    pub subject: u64,
    #[serde(rename = "rol")]
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Issues and verifies identity tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        TokenCodec {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for `subject` carrying `role`. Any role string is accepted.
    pub fn issue(&self, subject: u64, role: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            subject,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    /// Check signature, structure and expiry. Every failure is `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("token rejected: {}", e);
                AppError::InvalidToken
            })?;
        // Valid only while now < exp.
        if claims.exp <= Utc::now().timestamp() {
            tracing::debug!(exp = claims.exp, "token rejected: expired");
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }
}
