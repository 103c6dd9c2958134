//! Authentication and authorization ports.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::domain::Role;

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub role: Role,
    pub exp: i64,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Seconds until expiry, measured from `now`.
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Token service trait for signed identity tokens.
pub trait TokenService: Send + Sync {
    /// Sign a token for `subject` carrying `role`, valid for `ttl`.
    fn issue(&self, subject: Uuid, role: &Role, ttl: TimeDelta) -> Result<IssuedToken, AuthError>;

    /// Verify signature, algorithm and expiry, then decode the claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// TTL used for login tokens.
    fn default_ttl(&self) -> TimeDelta;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Invalid authorization header: {0}")]
    InvalidHeader(String),

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}
