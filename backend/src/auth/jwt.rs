//! Session token issuance and verification
//!
//! Tokens are HS256 JWTs carrying the user's identity and role, valid for a
//! fixed window from issuance. Keys are derived once at startup and shared.

use chrono::{DateTime, Duration, Utc};
use employee_portal_shared::{AuthError, Role};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// Identity encoded into a session token
#[derive(Debug, Clone)]
pub struct TokenIdentity<'a> {
    pub user_id: Uuid,
    pub email: &'a str,
    pub role: Role,
}

/// Pre-computed JWT keys
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// JWT service for session tokens
///
/// Cloning is cheap; keys sit behind `Arc`.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    expiry_secs: i64,
    validation: Arc<Validation>,
}

impl JwtService {
    /// Create a service signing with `secret`, issuing tokens valid for `expiry_secs`
    pub fn new(secret: &str, expiry_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The validity window is exact; no clock-skew allowance
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys: JwtKeys::new(secret),
            expiry_secs,
            validation: Arc::new(validation),
        }
    }

    /// Issue a token valid from now
    #[inline]
    pub fn issue(&self, identity: &TokenIdentity<'_>) -> anyhow::Result<String> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if at `issued_at`
    pub fn issue_at(
        &self,
        identity: &TokenIdentity<'_>,
        issued_at: DateTime<Utc>,
    ) -> anyhow::Result<String> {
        let exp = issued_at + Duration::seconds(self.expiry_secs);

        let claims = Claims {
            sub: identity.user_id.to_string(),
            email: identity.email.to_string(),
            role: identity.role,
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign session token: {}", e))
    }

    /// Verify a token and return its claims
    ///
    /// Distinguishes an expired token from one that is malformed or
    /// carries a bad signature.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Token lifetime in seconds
    #[inline]
    pub fn expiry_secs(&self) -> i64 {
        self.expiry_secs
    }
}
