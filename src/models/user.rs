use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{Permission, Role};
use crate::models::profile::Profile;

/// The identity asserted for the current request. Never carries a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    #[schema(value_type = Object)]
    pub metadata: Value,
}

impl SessionUser {
    pub fn full_name(&self) -> Option<&str> {
        self.metadata.get("full_name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct DbIdentity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbIdentity> for SessionUser {
    fn from(value: DbIdentity) -> Self {
        SessionUser {
            id: value.id,
            email: value.email,
            metadata: value.metadata,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "editor@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: SessionUser,
    pub profile: Option<Profile>,
    pub role: Option<Role>,
    pub permissions: Vec<Permission>,
}
