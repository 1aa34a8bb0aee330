//! Application state management
//!
//! Shared state handed to every handler through Axum's state extraction.
//! Everything is built once at startup and is read-only afterwards; every
//! field is an `Arc` or a small `Copy` value, so cloning is O(1).

use crate::auth::{JwtService, PasswordService, ResetTokenManager};
use crate::config::AppConfig;
use crate::email::{LogMailer, Mailer};
use crate::repositories::{InMemoryUserStore, UserStore};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
    /// Pre-initialized JWT service with cached keys
    jwt: JwtService,
    passwords: PasswordService,
    resets: ResetTokenManager,
}

impl AppState {
    /// Build the state from a credential store, a mailer and the configuration.
    ///
    /// Derives the JWT keys from the configured secret; call once at startup.
    pub fn new(store: Arc<dyn UserStore>, mailer: Arc<dyn Mailer>, config: AppConfig) -> Self {
        let jwt = JwtService::new(config.jwt.secret.expose_secret(), config.jwt.expiry_secs);
        let passwords = PasswordService::new(config.auth.bcrypt_cost);
        let resets = ResetTokenManager::new(config.auth.reset_token_ttl_secs);

        Self {
            store,
            mailer,
            config: Arc::new(config),
            jwt,
            passwords,
            resets,
        }
    }

    /// State over an empty in-memory store that logs mail instead of sending it
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(Arc::new(InMemoryUserStore::new()), Arc::new(LogMailer), config)
    }

    #[inline]
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    #[inline]
    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    #[inline]
    pub fn resets(&self) -> &ResetTokenManager {
        &self.resets
    }
}
