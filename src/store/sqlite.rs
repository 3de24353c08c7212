use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{IdentityAdmin, IdentityProvider, ProfileStore, StoreError};
use crate::db::row_parsers;
use crate::jwt::{JwtConfig, Session};
use crate::models::profile::{Profile, ProfileUpsert};
use crate::models::user::{DbIdentity, SessionUser};
use crate::utils::{hash_password, utc_now, verify_password};

const IDENTITY_COLUMNS: &str = "id, email, password_hash, metadata, created_at, updated_at";
const PROFILE_COLUMNS: &str = "id, email, full_name, avatar_url, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DbIdentity>, StoreError> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_parsers::db_identity_from_row).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<DbIdentity>, StoreError> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = ?");
        let row = sqlx::query(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_parsers::db_identity_from_row).transpose()
    }

    /// Password sign-in. `Ok(None)` for an unknown email or a wrong password.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<SessionUser>, StoreError> {
        let Some(identity) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        let ok = verify_password(password, &identity.password_hash).map_err(|err| StoreError::corrupt(err.to_string()))?;
        Ok(ok.then(|| identity.into()))
    }
}

#[async_trait]
impl IdentityAdmin for SqliteIdentityStore {
    async fn list_users(&self) -> Result<Vec<SessionUser>, StoreError> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY created_at");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row_parsers::db_identity_from_row(row).map(SessionUser::from))
            .collect()
    }

    async fn create_user(&self, email: &str, password: &str, metadata: Value) -> Result<SessionUser, StoreError> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(StoreError::rejected("a valid email address is required"));
        }

        let password_hash = hash_password(password).map_err(|err| StoreError::rejected(err.to_string()))?;
        let id = Uuid::new_v4();
        let now = utc_now().to_rfc3339();

        sqlx::query(
            "INSERT INTO identities (id, email, password_hash, metadata, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&email)
        .bind(password_hash)
        .bind(metadata.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %id, email = %email, "identity created");

        Ok(SessionUser { id, email, metadata })
    }
}

/// Resolves a session token to the identity row it was issued for.
#[derive(Debug, Clone)]
pub struct JwtIdentityProvider {
    jwt: Arc<JwtConfig>,
    identities: SqliteIdentityStore,
}

impl JwtIdentityProvider {
    pub fn new(jwt: Arc<JwtConfig>, identities: SqliteIdentityStore) -> Self {
        Self { jwt, identities }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn current_user(&self, session: &Session) -> Result<Option<SessionUser>, StoreError> {
        let Some(token) = session.token() else {
            return Ok(None);
        };

        let claims = match self.jwt.decode(token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(error = %err, "session token rejected");
                return Ok(None);
            }
        };

        Ok(self.identities.find_by_id(claims.sub).await?.map(SessionUser::from))
    }
}

#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn select_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .as_ref()
            .map(row_parsers::db_profile_from_row)
            .transpose()?
            .map(Profile::from))
    }

    async fn upsert(&self, profile: ProfileUpsert) -> Result<Profile, StoreError> {
        let now = utc_now().to_rfc3339();

        sqlx::query(
            "INSERT INTO profiles (id, email, full_name, avatar_url, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
               email = excluded.email, \
               full_name = excluded.full_name, \
               avatar_url = excluded.avatar_url, \
               role = excluded.role, \
               updated_at = excluded.updated_at",
        )
        .bind(profile.id.to_string())
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.avatar_url)
        .bind(profile.role.map(|role| role.as_str()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.select_by_id(profile.id)
            .await?
            .ok_or_else(|| StoreError::corrupt(format!("profile {} missing after upsert", profile.id)))
    }

    async fn insert_if_absent(&self, profile: ProfileUpsert) -> Result<Profile, StoreError> {
        let now = utc_now().to_rfc3339();

        let inserted = sqlx::query(
            "INSERT INTO profiles (id, email, full_name, avatar_url, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(profile.id.to_string())
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.avatar_url)
        .bind(profile.role.map(|role| role.as_str()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            tracing::debug!(profile_id = %profile.id, "profile already present; insert skipped");
        }

        self.select_by_id(profile.id)
            .await?
            .ok_or_else(|| StoreError::corrupt(format!("profile {} missing after insert", profile.id)))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
