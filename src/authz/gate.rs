use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::role::Role;
use crate::jwt::Session;
use crate::models::profile::Profile;
use crate::models::user::SessionUser;
use crate::store::{IdentityProvider, ProfileStore};

/// Why an authorization attempt ended without admission.
///
/// The gate only reports the outcome. Page handlers turn it into a redirect,
/// action handlers into an inline error string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Unauthorized")]
    Unauthorized,
}

impl Serialize for Denial {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything known about the caller after one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub user: Option<SessionUser>,
    pub profile: Option<Profile>,
    pub role: Option<Role>,
}

impl Resolution {
    /// No user means not authenticated. A user without a profile, or with a
    /// profile whose role is missing or outside `allowed`, is unauthorized.
    pub fn decide(&self, allowed: &[Role]) -> Result<Role, Denial> {
        if self.user.is_none() {
            return Err(Denial::NotAuthenticated);
        }
        match self.role {
            Some(role) if allowed.contains(&role) => Ok(role),
            _ => Err(Denial::Unauthorized),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: SessionUser,
    pub profile: Option<Profile>,
}

impl Authenticated {
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().and_then(|profile| profile.role)
    }
}

#[derive(Debug, Clone)]
pub struct Admitted {
    pub user: SessionUser,
    pub profile: Profile,
    pub role: Role,
}

/// Non-redirecting outcome for mutation actions. Check `error` first.
#[derive(Debug, Clone, Serialize)]
pub struct RoleCheck {
    pub user: Option<SessionUser>,
    pub profile: Option<Profile>,
    pub role: Option<Role>,
    pub error: Option<Denial>,
}

impl RoleCheck {
    pub fn into_result(self) -> Result<Admitted, Denial> {
        if let Some(denial) = self.error {
            return Err(denial);
        }
        match (self.user, self.profile, self.role) {
            (Some(user), Some(profile), Some(role)) => Ok(Admitted { user, profile, role }),
            (None, _, _) => Err(Denial::NotAuthenticated),
            _ => Err(Denial::Unauthorized),
        }
    }
}

/// Session authorization gate.
///
/// Every call reads the identity and then the profile afresh. Collaborator
/// failures are logged and count as "not found", so errors always end in
/// denial.
#[derive(Clone)]
pub struct Gate {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl Gate {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { identity, profiles }
    }

    pub async fn resolve(&self, session: &Session) -> Resolution {
        let user = match self.identity.current_user(session).await {
            Ok(Some(user)) => user,
            Ok(None) => return Resolution::default(),
            Err(err) => {
                tracing::warn!(error = %err, "identity lookup failed; treating caller as anonymous");
                return Resolution::default();
            }
        };

        let profile = match self.profiles.select_by_id(user.id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(user_id = %user.id, error = %err, "profile lookup failed; treating role as absent");
                None
            }
        };

        if profile.is_none() {
            tracing::debug!(user_id = %user.id, "no profile for authenticated user");
        }

        let role = profile.as_ref().and_then(|profile| profile.role);
        Resolution {
            user: Some(user),
            profile,
            role,
        }
    }

    pub async fn require_auth(&self, session: &Session) -> Result<Authenticated, Denial> {
        let Resolution { user, profile, .. } = self.resolve(session).await;
        match user {
            Some(user) => Ok(Authenticated { user, profile }),
            None => {
                tracing::debug!("denied: not authenticated");
                Err(Denial::NotAuthenticated)
            }
        }
    }

    pub async fn require_role(&self, session: &Session, allowed: &[Role]) -> Result<Admitted, Denial> {
        let resolution = self.resolve(session).await;
        if let Err(denial) = resolution.decide(allowed) {
            tracing::debug!(
                user_id = ?resolution.user.as_ref().map(|user| user.id),
                role = ?resolution.role,
                allowed = ?allowed,
                denial = %denial,
                "denied"
            );
            return Err(denial);
        }

        let Resolution { user, profile, role } = resolution;
        match (user, profile, role) {
            (Some(user), Some(profile), Some(role)) => {
                tracing::debug!(user_id = %user.id, role = %role, "admitted");
                Ok(Admitted { user, profile, role })
            }
            (None, _, _) => Err(Denial::NotAuthenticated),
            _ => Err(Denial::Unauthorized),
        }
    }

    pub async fn ensure_role(&self, session: &Session, allowed: &[Role]) -> RoleCheck {
        let resolution = self.resolve(session).await;
        let error = resolution.decide(allowed).err();
        if let Some(denial) = error {
            tracing::debug!(
                user_id = ?resolution.user.as_ref().map(|user| user.id),
                role = ?resolution.role,
                denial = %denial,
                "role check failed"
            );
        }

        let Resolution { user, profile, role } = resolution;
        RoleCheck {
            user,
            profile,
            role,
            error,
        }
    }
}
