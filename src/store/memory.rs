use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{IdentityAdmin, IdentityProvider, ProfileStore, StoreError};
use crate::authz::Role;
use crate::jwt::Session;
use crate::models::profile::{Profile, ProfileUpsert};
use crate::models::user::SessionUser;

/// Token-to-user table. The token string is the whole credential.
#[derive(Default)]
pub struct MemoryIdentities {
    users: RwLock<Vec<(String, SessionUser)>>,
    pub fail: AtomicBool,
}

impl MemoryIdentities {
    pub async fn sign_up(&self, token: &str, email: &str) -> SessionUser {
        let user = SessionUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            metadata: serde_json::json!({}),
        };
        self.users.write().await.push((token.to_string(), user.clone()));
        user
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentities {
    async fn current_user(&self, session: &Session) -> Result<Option<SessionUser>, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::corrupt("identity provider unavailable"));
        }
        let Some(token) = session.token() else {
            return Ok(None);
        };
        let users = self.users.read().await;
        Ok(users.iter().find(|(t, _)| t == token).map(|(_, user)| user.clone()))
    }
}

#[async_trait]
impl IdentityAdmin for MemoryIdentities {
    async fn list_users(&self) -> Result<Vec<SessionUser>, StoreError> {
        Ok(self.users.read().await.iter().map(|(_, user)| user.clone()).collect())
    }

    async fn create_user(&self, email: &str, password: &str, metadata: Value) -> Result<SessionUser, StoreError> {
        if password.len() < 8 {
            return Err(StoreError::rejected("password too short"));
        }
        let user = SessionUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            metadata,
        };
        let token = format!("token-{}", user.id);
        self.users.write().await.push((token, user.clone()));
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryProfiles {
    rows: RwLock<HashMap<Uuid, Profile>>,
    pub fail_reads: AtomicBool,
    pub reads: AtomicUsize,
}

impl MemoryProfiles {
    pub async fn insert(&self, user: &SessionUser, role: Option<Role>) -> Profile {
        let now = Utc::now();
        let profile = Profile {
            id: user.id,
            email: user.email.clone(),
            full_name: Some("Staff Member".to_string()),
            avatar_url: None,
            role,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.insert(user.id, profile.clone());
        profile
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfiles {
    async fn select_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::corrupt("profile store unavailable"));
        }
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn upsert(&self, profile: ProfileUpsert) -> Result<Profile, StoreError> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let created_at = rows.get(&profile.id).map(|p| p.created_at).unwrap_or(now);
        let row = Profile {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            role: profile.role,
            created_at,
            updated_at: now,
        };
        rows.insert(row.id, row.clone());
        Ok(row)
    }
    async fn insert_if_absent(&self, profile: ProfileUpsert) -> Result<Profile, StoreError> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let row = rows.entry(profile.id).or_insert_with(|| Profile {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            role: profile.role,
            created_at: now,
            updated_at: now,
        });
        Ok(row.clone())
    }
}
