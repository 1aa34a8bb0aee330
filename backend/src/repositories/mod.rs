//! Credential store
//!
//! `UserStore` is the data access seam. `UserRepository` backs it with
//! PostgreSQL; `InMemoryUserStore` backs it with a map for tests and demos.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use employee_portal_shared::{EmployeeView, Role};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::UserRepository;

/// Store-level failures the service layer reacts to
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,
}

/// A persisted user account
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department: String,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn to_view(&self) -> EmployeeView {
        EmployeeView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
            role: self.role,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department: String,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

/// Case-insensitive substring match used by listing filters
pub fn matches_search(record: &UserRecord, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    record.name.to_lowercase().contains(&needle)
        || record.email.to_lowercase().contains(&needle)
        || record.department.to_lowercase().contains(&needle)
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; fails with `StoreError::DuplicateEmail` if the email is taken
    async fn create(&self, user: NewUser) -> Result<UserRecord>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// All users in creation order, optionally filtered by `search`
    async fn list(&self, search: Option<&str>) -> Result<Vec<UserRecord>>;

    /// Apply a partial update; `None` if no user has `id`
    async fn update(&self, id: Uuid, changes: UpdateUser) -> Result<Option<UserRecord>>;

    /// Remove a user; `false` if no user has `id`
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Record a pending reset, replacing any earlier one
    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// The user holding an unexpired reset whose hash equals `token_hash`
    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>>;

    /// Atomically redeem a pending reset.
    ///
    /// Matches a user whose stored hash equals `token_hash` and whose expiry is
    /// after `now`, rewrites the password hash and clears the reset fields.
    /// Returns `None` when nothing matched.
    async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<Option<UserRecord>>;

    /// Liveness probe for readiness checks
    async fn ping(&self) -> Result<()>;
}
