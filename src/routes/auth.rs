use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::role_permissions;
use crate::errors::{AppError, AppResult};
use crate::jwt::{clear_session_cookie, session_cookie, Session};
use crate::models::user::{AuthResponse, LoginRequest, MeResponse};
use crate::provision::complete_sign_in;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    message: String,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<([(axum::http::HeaderName, String); 1], Json<AuthResponse>)> {
    let user = state
        .identities
        .verify_credentials(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    complete_sign_in(state.profiles.as_ref(), &user).await?;

    let token = state.jwt.encode(&user)?;
    let cookie = session_cookie(&token, state.jwt.max_age_secs());
    tracing::info!(user_id = %user.id, "signed in");

    Ok(([(SET_COOKIE, cookie)], Json(AuthResponse { token, user })))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user with profile and role", body = MeResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(State(state): State<AppState>, session: Session) -> AppResult<Json<MeResponse>> {
    let auth = state
        .gate
        .require_auth(&session)
        .await
        .map_err(|denial| AppError::unauthorized(denial.to_string()))?;

    let role = auth.role();
    let permissions = role.map(|role| role_permissions(role).to_vec()).unwrap_or_default();

    Ok(Json(MeResponse {
        user: auth.user,
        profile: auth.profile,
        role,
        permissions,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logout acknowledged", body = MessageResponse))
)]
pub async fn logout() -> ([(axum::http::HeaderName, String); 1], Json<MessageResponse>) {
    (
        [(SET_COOKIE, clear_session_cookie())],
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}
