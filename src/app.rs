use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::Gate;
use crate::config::RedirectConfig;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{admin, auth, health};
use crate::store::{JwtIdentityProvider, ProfileStore, SqliteIdentityStore, SqliteProfileStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub identities: Arc<SqliteIdentityStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub gate: Gate,
    pub redirects: Arc<RedirectConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, redirects: RedirectConfig) -> Self {
        let jwt = Arc::new(jwt);
        let identities = SqliteIdentityStore::new(pool.clone());
        let profiles: Arc<dyn ProfileStore> = Arc::new(SqliteProfileStore::new(pool.clone()));
        let provider = Arc::new(JwtIdentityProvider::new(Arc::clone(&jwt), identities.clone()));

        Self {
            gate: Gate::new(provider, Arc::clone(&profiles)),
            identities: Arc::new(identities),
            profiles,
            pool,
            jwt,
            redirects: Arc::new(redirects),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let redirects = RedirectConfig::from_env()?;
    Ok(router(AppState::new(pool, jwt_config, redirects)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let admin_routes = Router::new()
        .route("/", get(admin::dashboard))
        .route("/actions/set-role", post(admin::set_role))
        .route("/actions/fix-profile", post(admin::fix_profile))
        .route("/*section", get(admin::section));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
