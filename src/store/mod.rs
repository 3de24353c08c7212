//! Collaborator contracts the authorization core depends on.
//!
//! The gate only sees [`IdentityProvider`] and [`ProfileStore`]; any backend
//! satisfying those two traits can stand in for the SQLite one shipped here.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::jwt::Session;
use crate::models::profile::{Profile, ProfileUpsert};
use crate::models::user::SessionUser;

pub mod sqlite;

#[cfg(test)]
pub(crate) mod memory;

pub use sqlite::{JwtIdentityProvider, SqliteIdentityStore, SqliteProfileStore};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Rejected(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}

/// Resolves who is making the request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the session carries no valid credentials.
    async fn current_user(&self, session: &Session) -> Result<Option<SessionUser>, StoreError>;
}

/// The `profiles` table, keyed on the identity id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn select_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Insert, or overwrite email, full_name, avatar_url, role and
    /// updated_at when a row with the same id exists.
    async fn upsert(&self, profile: ProfileUpsert) -> Result<Profile, StoreError>;

    /// Insert only when no row with the same id exists, and return whatever
    /// row is stored afterwards. An existing row is never modified.
    async fn insert_if_absent(&self, profile: ProfileUpsert) -> Result<Profile, StoreError>;
}

/// Account administration used by sign-in completion and provisioning.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    async fn list_users(&self) -> Result<Vec<SessionUser>, StoreError>;

    async fn create_user(&self, email: &str, password: &str, metadata: Value) -> Result<SessionUser, StoreError>;
}
