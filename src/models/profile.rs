use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::Role;

/// Durable record binding an identity to its role and display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    /// `None` when the stored value is missing or not a known role.
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DbProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbProfile> for Profile {
    fn from(db: DbProfile) -> Self {
        let role = db.role.as_deref().and_then(|raw| {
            let parsed = Role::parse(raw);
            if parsed.is_none() {
                tracing::warn!(profile_id = %db.id, stored_role = %raw, "unrecognised role on profile");
            }
            parsed
        });

        Profile {
            id: db.id,
            email: db.email,
            full_name: db.full_name,
            avatar_url: db.avatar_url,
            role,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Write model for the keyed upsert. Every mutable column is overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpsert {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
}

impl ProfileUpsert {
    /// Start from an existing row so untouched columns are written back as-is.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            role: profile.role,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FixProfileRequest {
    /// Defaults to the caller's own profile.
    pub user_id: Option<Uuid>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
}

/// Result of a privileged profile action, shaped for inline display.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub profile: Option<Profile>,
    pub error: Option<String>,
}
