//! Privileged profile mutations.
//!
//! Each action runs the non-redirecting role check, then re-reads the
//! actor's stored role right before writing. A session that was admitted a
//! moment ago but has since been demoted gets `Unauthorized`.

use uuid::Uuid;

use crate::authz::{Admitted, Denial, Gate, Role};
use crate::jwt::Session;
use crate::models::profile::{FixProfileRequest, Profile, ProfileUpsert};
use crate::store::{IdentityAdmin, ProfileStore, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    #[error("{0}")]
    Denied(Denial),
    #[error("Profile not found")]
    NotFound,
    #[error("Failed to update profile")]
    Store(#[from] StoreError),
}

impl From<Denial> for ActionError {
    fn from(value: Denial) -> Self {
        Self::Denied(value)
    }
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];

async fn authorize_admin(gate: &Gate, profiles: &dyn ProfileStore, session: &Session) -> Result<Admitted, ActionError> {
    let actor = gate.ensure_role(session, ADMIN_ONLY).await.into_result()?;

    let current = profiles.select_by_id(actor.user.id).await?;
    if current.and_then(|profile| profile.role) != Some(Role::Admin) {
        tracing::warn!(actor_id = %actor.user.id, "actor no longer admin at write time");
        return Err(Denial::Unauthorized.into());
    }

    Ok(actor)
}

/// Change the role on an existing profile.
pub async fn set_profile_role(
    gate: &Gate,
    profiles: &dyn ProfileStore,
    session: &Session,
    target: Uuid,
    role: Role,
) -> Result<Profile, ActionError> {
    let actor = authorize_admin(gate, profiles, session).await?;

    let existing = profiles.select_by_id(target).await?.ok_or(ActionError::NotFound)?;
    let previous = existing.role;
    let updated = profiles
        .upsert(ProfileUpsert::from_profile(&existing).with_role(role))
        .await?;

    tracing::info!(
        actor_id = %actor.user.id,
        target_id = %target,
        previous = ?previous,
        role = %role,
        "profile role changed"
    );

    Ok(updated)
}

/// Repair a profile row: create it from the identity record when missing,
/// and overwrite any field supplied in the request.
pub async fn fix_profile(
    gate: &Gate,
    identities: &dyn IdentityAdmin,
    profiles: &dyn ProfileStore,
    session: &Session,
    request: FixProfileRequest,
) -> Result<Profile, ActionError> {
    let actor = authorize_admin(gate, profiles, session).await?;
    let target = request.user_id.unwrap_or(actor.user.id);

    let mut upsert = match profiles.select_by_id(target).await? {
        Some(profile) => ProfileUpsert::from_profile(&profile),
        None => {
            let identity = identities
                .list_users()
                .await?
                .into_iter()
                .find(|user| user.id == target)
                .ok_or(ActionError::NotFound)?;
            ProfileUpsert {
                id: identity.id,
                full_name: identity.full_name().map(str::to_string),
                email: identity.email,
                avatar_url: None,
                role: None,
            }
        }
    };

    if let Some(full_name) = request.full_name {
        upsert.full_name = Some(full_name);
    }
    if let Some(avatar_url) = request.avatar_url {
        upsert.avatar_url = Some(avatar_url);
    }
    if let Some(role) = request.role {
        upsert.role = Some(role);
    }

    let fixed = profiles.upsert(upsert).await?;
    tracing::info!(actor_id = %actor.user.id, target_id = %target, role = ?fixed.role, "profile repaired");

    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::memory::{MemoryIdentities, MemoryProfiles};

    struct Fixture {
        identities: Arc<MemoryIdentities>,
        profiles: Arc<MemoryProfiles>,
        gate: Gate,
    }

    fn fixture() -> Fixture {
        let identities = Arc::new(MemoryIdentities::default());
        let profiles = Arc::new(MemoryProfiles::default());
        let gate = Gate::new(identities.clone(), profiles.clone());
        Fixture {
            identities,
            profiles,
            gate,
        }
    }

    #[tokio::test]
    async fn admin_changes_role_and_next_check_sees_it() {
        let f = fixture();
        let admin = f.identities.sign_up("t-admin", "admin@example.com").await;
        f.profiles.insert(&admin, Some(Role::Admin)).await;
        let editor = f.identities.sign_up("t-editor", "editor@example.com").await;
        f.profiles.insert(&editor, Some(Role::Editor)).await;

        let editor_session = Session::with_token("t-editor");
        assert_eq!(
            f.gate.ensure_role(&editor_session, ADMIN_ONLY).await.error,
            Some(Denial::Unauthorized)
        );

        let updated = set_profile_role(
            &f.gate,
            f.profiles.as_ref(),
            &Session::with_token("t-admin"),
            editor.id,
            Role::Admin,
        )
        .await
        .unwrap();
        assert_eq!(updated.role, Some(Role::Admin));
        assert_eq!(updated.email, "editor@example.com");

        let check = f.gate.ensure_role(&editor_session, ADMIN_ONLY).await;
        assert_eq!(check.error, None);
        assert_eq!(check.role, Some(Role::Admin));
    }

    #[tokio::test]
    async fn non_admins_cannot_change_roles() {
        let f = fixture();
        let editor = f.identities.sign_up("t-editor", "editor@example.com").await;
        f.profiles.insert(&editor, Some(Role::Editor)).await;

        let err = set_profile_role(
            &f.gate,
            f.profiles.as_ref(),
            &Session::with_token("t-editor"),
            editor.id,
            Role::Admin,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::Denied(Denial::Unauthorized)));
        assert_eq!(err.to_string(), "Unauthorized");

        let err = set_profile_role(&f.gate, f.profiles.as_ref(), &Session::anonymous(), editor.id, Role::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not authenticated");

        let stored = f.profiles.select_by_id(editor.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Some(Role::Editor));
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let f = fixture();
        let admin = f.identities.sign_up("t-admin", "admin@example.com").await;
        f.profiles.insert(&admin, Some(Role::Admin)).await;

        let err = set_profile_role(
            &f.gate,
            f.profiles.as_ref(),
            &Session::with_token("t-admin"),
            Uuid::new_v4(),
            Role::Editor,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::NotFound));
    }

    #[tokio::test]
    async fn demoted_admin_loses_access_immediately() {
        let f = fixture();
        let first = f.identities.sign_up("t-first", "first@example.com").await;
        f.profiles.insert(&first, Some(Role::Admin)).await;
        let second = f.identities.sign_up("t-second", "second@example.com").await;
        f.profiles.insert(&second, Some(Role::Admin)).await;

        set_profile_role(&f.gate, f.profiles.as_ref(), &Session::with_token("t-first"), second.id, Role::Viewer)
            .await
            .unwrap();

        let err = set_profile_role(&f.gate, f.profiles.as_ref(), &Session::with_token("t-second"), first.id, Role::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Denied(Denial::Unauthorized)));
    }

    #[tokio::test]
    async fn fix_profile_recreates_missing_row_from_identity() {
        let f = fixture();
        let admin = f.identities.sign_up("t-admin", "admin@example.com").await;
        f.profiles.insert(&admin, Some(Role::Admin)).await;
        let orphan = f.identities.sign_up("t-orphan", "orphan@example.com").await;

        let fixed = fix_profile(
            &f.gate,
            f.identities.as_ref(),
            f.profiles.as_ref(),
            &Session::with_token("t-admin"),
            FixProfileRequest {
                user_id: Some(orphan.id),
                full_name: Some("Recovered".to_string()),
                avatar_url: None,
                role: Some(Role::Editor),
            },
        )
        .await
        .unwrap();

        assert_eq!(fixed.id, orphan.id);
        assert_eq!(fixed.email, "orphan@example.com");
        assert_eq!(fixed.full_name.as_deref(), Some("Recovered"));
        assert_eq!(fixed.role, Some(Role::Editor));
    }

    #[tokio::test]
    async fn fix_profile_defaults_to_the_caller_and_keeps_untouched_fields() {
        let f = fixture();
        let admin = f.identities.sign_up("t-admin", "admin@example.com").await;
        f.profiles.insert(&admin, Some(Role::Admin)).await;

        let fixed = fix_profile(
            &f.gate,
            f.identities.as_ref(),
            f.profiles.as_ref(),
            &Session::with_token("t-admin"),
            FixProfileRequest {
                avatar_url: Some("/avatars/admin.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(fixed.id, admin.id);
        assert_eq!(fixed.role, Some(Role::Admin));
        assert_eq!(fixed.full_name.as_deref(), Some("Staff Member"));
        assert_eq!(fixed.avatar_url.as_deref(), Some("/avatars/admin.png"));
    }

    #[tokio::test]
    async fn fix_profile_for_unknown_identity_is_not_found() {
        let f = fixture();
        let admin = f.identities.sign_up("t-admin", "admin@example.com").await;
        f.profiles.insert(&admin, Some(Role::Admin)).await;

        let err = fix_profile(
            &f.gate,
            f.identities.as_ref(),
            f.profiles.as_ref(),
            &Session::with_token("t-admin"),
            FixProfileRequest {
                user_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::NotFound));
    }
}
