//! Admin area.
//!
//! Page routes use the redirecting gate: any denial becomes a 303 to the
//! login page or the site root, with no detail in the body. Action routes use
//! the non-redirecting check and answer with a short error string instead.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::actions::{self, ActionError};
use crate::app::AppState;
use crate::authz::{admin_navigation, allowed_roles, role_permissions, Denial, NavItem, Permission, Role, ADMIN_PAGES};
use crate::jwt::Session;
use crate::models::profile::{ActionResponse, FixProfileRequest, Profile, SetRoleRequest};

/// What an admin page needs to render for the admitted caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPageContext {
    pub path: String,
    pub title: Option<&'static str>,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub navigation: Vec<NavItem>,
    pub profile: Profile,
}

#[utoipa::path(
    get,
    path = "/admin",
    tag = "Admin",
    responses(
        (status = 200, description = "Dashboard context", body = AdminPageContext),
        (status = 303, description = "Redirect to login or site root")
    ),
    security(("bearerAuth" = []))
)]
pub async fn dashboard(State(state): State<AppState>, session: Session) -> Result<Json<AdminPageContext>, Redirect> {
    render_page(&state, &session, "/admin".to_string()).await
}

#[utoipa::path(
    get,
    path = "/admin/{section}",
    tag = "Admin",
    params(("section" = String, Path, description = "Admin section, e.g. posts or users")),
    responses(
        (status = 200, description = "Section context", body = AdminPageContext),
        (status = 303, description = "Redirect to login or site root")
    ),
    security(("bearerAuth" = []))
)]
pub async fn section(
    State(state): State<AppState>,
    session: Session,
    Path(section): Path<String>,
) -> Result<Json<AdminPageContext>, Redirect> {
    render_page(&state, &session, format!("/admin/{}", section.trim_start_matches('/'))).await
}

async fn render_page(state: &AppState, session: &Session, path: String) -> Result<Json<AdminPageContext>, Redirect> {
    // Unknown pages get an empty allow-list, so they deny like any other
    // insufficient role.
    let allowed = allowed_roles(&path).unwrap_or(&[]);

    let admitted = state.gate.require_role(session, allowed).await.map_err(|denial| {
        tracing::debug!(path = %path, denial = %denial, "admin page denied");
        state.redirects.redirect(denial)
    })?;

    let title = ADMIN_PAGES.iter().find(|page| page.path == path).map(|page| page.title);

    Ok(Json(AdminPageContext {
        title,
        role: admitted.role,
        permissions: role_permissions(admitted.role).to_vec(),
        navigation: admin_navigation(admitted.role),
        profile: admitted.profile,
        path,
    }))
}

#[utoipa::path(
    post,
    path = "/admin/actions/set-role",
    tag = "Admin",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ActionResponse),
        (status = 401, description = "Not authenticated", body = ActionResponse),
        (status = 403, description = "Unauthorized", body = ActionResponse),
        (status = 404, description = "Profile not found", body = ActionResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn set_role(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SetRoleRequest>,
) -> (StatusCode, Json<ActionResponse>) {
    let result =
        actions::set_profile_role(&state.gate, state.profiles.as_ref(), &session, request.user_id, request.role).await;
    action_response(result)
}

#[utoipa::path(
    post,
    path = "/admin/actions/fix-profile",
    tag = "Admin",
    request_body = FixProfileRequest,
    responses(
        (status = 200, description = "Profile repaired", body = ActionResponse),
        (status = 401, description = "Not authenticated", body = ActionResponse),
        (status = 403, description = "Unauthorized", body = ActionResponse),
        (status = 404, description = "Identity not found", body = ActionResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn fix_profile(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<FixProfileRequest>,
) -> (StatusCode, Json<ActionResponse>) {
    let result = actions::fix_profile(
        &state.gate,
        state.identities.as_ref(),
        state.profiles.as_ref(),
        &session,
        request,
    )
    .await;
    action_response(result)
}

fn action_response(result: Result<Profile, ActionError>) -> (StatusCode, Json<ActionResponse>) {
    match result {
        Ok(profile) => (
            StatusCode::OK,
            Json(ActionResponse {
                profile: Some(profile),
                error: None,
            }),
        ),
        Err(err) => {
            let status = match &err {
                ActionError::Denied(Denial::NotAuthenticated) => StatusCode::UNAUTHORIZED,
                ActionError::Denied(Denial::Unauthorized) => StatusCode::FORBIDDEN,
                ActionError::NotFound => StatusCode::NOT_FOUND,
                ActionError::Store(source) => {
                    tracing::error!(error = %source, "profile action failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                Json(ActionResponse {
                    profile: None,
                    error: Some(err.to_string()),
                }),
            )
        }
    }
}
