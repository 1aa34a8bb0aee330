//! In-memory user store
//!
//! Same contract as the PostgreSQL repository, held in a map behind an async
//! lock. Used by the router tests and for running the service without a
//! database.

use super::{matches_search, NewUser, StoreError, UpdateUser, UserRecord, UserStore};
use crate::auth::is_active;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail.into());
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            department: user.department,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == email))
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<UserRecord>> {
        let users = self.users.read().await;
        let mut found: Vec<UserRecord> = users
            .values()
            .filter(|u| search.map_or(true, |needle| matches_search(u, needle)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> Result<Option<UserRecord>> {
        let mut users = self.users.write().await;

        if let Some(email) = &changes.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail.into());
            }
        }

        let Some(record) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            record.name = name;
        }
        if let Some(email) = changes.email {
            record.email = email;
        }
        if let Some(department) = changes.department {
            record.department = department;
        }
        record.updated_at = Utc::now();

        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(record) = self.users.write().await.get_mut(&id) {
            record.reset_password_token = Some(token_hash.to_string());
            record.reset_password_expires = Some(expires_at);
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                is_active(
                    u.reset_password_token.as_deref(),
                    u.reset_password_expires,
                    token_hash,
                    now,
                )
            })
            .cloned())
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<Option<UserRecord>> {
        let mut users = self.users.write().await;
        let matched = users.values_mut().find(|u| {
            is_active(
                u.reset_password_token.as_deref(),
                u.reset_password_expires,
                token_hash,
                now,
            )
        });

        Ok(matched.map(|record| {
            record.password_hash = new_password_hash.to_string();
            record.reset_password_token = None;
            record.reset_password_expires = None;
            record.updated_at = Utc::now();
            record.clone()
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
