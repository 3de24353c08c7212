//! Profile creation: admin seeding and first sign-in.

use serde_json::json;

use crate::authz::Role;
use crate::models::profile::{Profile, ProfileUpsert};
use crate::models::user::SessionUser;
use crate::store::{IdentityAdmin, ProfileStore, StoreError};

/// Role written on a profile created by a user's first sign-in.
pub const FIRST_SIGN_IN_ROLE: Role = Role::Viewer;

#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub user: SessionUser,
    pub profile: Profile,
    pub created_identity: bool,
}

/// Find or create the identity for `email`, then upsert its profile with
/// the admin role. Running it again with the same email changes nothing but
/// `updated_at`.
pub async fn provision_admin(
    identities: &dyn IdentityAdmin,
    profiles: &dyn ProfileStore,
    email: &str,
    password: &str,
    full_name: Option<&str>,
) -> Result<ProvisionOutcome, StoreError> {
    let wanted = email.trim();
    let existing = identities
        .list_users()
        .await?
        .into_iter()
        .find(|user| user.email.eq_ignore_ascii_case(wanted));

    let (user, created_identity) = match existing {
        Some(user) => {
            tracing::info!(user_id = %user.id, email = %user.email, "identity already exists");
            (user, false)
        }
        None => {
            let metadata = match full_name {
                Some(name) => json!({ "full_name": name }),
                None => json!({}),
            };
            (identities.create_user(wanted, password, metadata).await?, true)
        }
    };

    let current = profiles.select_by_id(user.id).await?;
    let full_name = full_name
        .map(str::to_string)
        .or_else(|| current.as_ref().and_then(|p| p.full_name.clone()))
        .or_else(|| user.full_name().map(str::to_string));

    let profile = profiles
        .upsert(ProfileUpsert {
            id: user.id,
            email: user.email.clone(),
            full_name,
            avatar_url: current.and_then(|p| p.avatar_url),
            role: Some(Role::Admin),
        })
        .await?;

    tracing::info!(user_id = %user.id, created_identity, "admin profile provisioned");

    Ok(ProvisionOutcome {
        user,
        profile,
        created_identity,
    })
}

/// Create the profile for a user signing in for the first time. An existing
/// profile is returned untouched, whatever its role, including one written
/// between the lookup and the insert.
pub async fn complete_sign_in(profiles: &dyn ProfileStore, user: &SessionUser) -> Result<Profile, StoreError> {
    if let Some(profile) = profiles.select_by_id(user.id).await? {
        return Ok(profile);
    }

    let profile = profiles
        .insert_if_absent(ProfileUpsert {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name().map(str::to_string),
            avatar_url: None,
            role: Some(FIRST_SIGN_IN_ROLE),
        })
        .await?;

    tracing::info!(user_id = %user.id, role = ?profile.role, "profile ready after first sign-in");
    Ok(profile)
}
