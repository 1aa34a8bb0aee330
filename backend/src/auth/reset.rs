//! Password reset secrets
//!
//! A reset secret is 32 random bytes, hex-encoded, handed to the user once.
//! Only its SHA-256 digest is persisted, together with an expiry.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

const SECRET_BYTES: usize = 32;

/// A freshly issued reset secret and what gets stored for it
#[derive(Debug, Clone)]
pub struct IssuedReset {
    /// Raw secret; goes into the reset link and nowhere else
    pub secret: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues reset secrets and hashes presented ones
#[derive(Debug, Clone, Copy)]
pub struct ResetTokenManager {
    ttl: Duration,
}

impl ResetTokenManager {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a secret expiring one TTL after `now`
    pub fn issue(&self, now: DateTime<Utc>) -> IssuedReset {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let secret = hex::encode(bytes);

        IssuedReset {
            token_hash: hash_secret(&secret),
            secret,
            expires_at: now + self.ttl,
        }
    }
}

/// Hash a presented secret the same way issued secrets are stored
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether a stored reset still authorizes a password change
pub fn is_active(
    stored_hash: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    presented_hash: &str,
    now: DateTime<Utc>,
) -> bool {
    match (stored_hash, expires_at) {
        (Some(stored), Some(expiry)) => !stored.is_empty() && stored == presented_hash && expiry > now,
        _ => false,
    }
}
