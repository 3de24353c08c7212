#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use site_cms::app::{router, AppState};
use site_cms::authz::Role;
use site_cms::config::RedirectConfig;
use site_cms::jwt::JwtConfig;
use site_cms::models::profile::ProfileUpsert;
use site_cms::models::user::SessionUser;
use site_cms::store::{IdentityAdmin, ProfileStore, SqliteIdentityStore, SqliteProfileStore};

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    // keeps the database file alive for the duration of the test
    _dir: TempDir,
    pub pool: SqlitePool,
    pub app: Router,
}

pub async fn migrated_pool() -> Result<(TempDir, SqlitePool)> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;

    Ok((dir, pool))
}

pub async fn spawn_app() -> Result<TestApp> {
    let (dir, pool) = migrated_pool().await?;
    let state = AppState::new(pool.clone(), JwtConfig::new("test-secret", 1), RedirectConfig::default());
    Ok(TestApp {
        _dir: dir,
        pool,
        app: router(state),
    })
}

impl TestApp {
    /// Create an identity and, when `role` is given, its profile.
    pub async fn staff(&self, email: &str, role: Option<Role>) -> Result<SessionUser> {
        let identities = SqliteIdentityStore::new(self.pool.clone());
        let user = identities.create_user(email, PASSWORD, json!({ "full_name": "Test Staff" })).await?;
        if let Some(role) = role {
            SqliteProfileStore::new(self.pool.clone())
                .upsert(ProfileUpsert {
                    id: user.id,
                    email: user.email.clone(),
                    full_name: Some("Test Staff".to_string()),
                    avatar_url: None,
                    role: Some(role),
                })
                .await?;
        }
        Ok(user)
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let (status, body) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "email": email, "password": PASSWORD }).to_string()))?,
            )
            .await?;
        if status != StatusCode::OK {
            anyhow::bail!("login failed: {} - {}", status, body);
        }
        Ok(body.get("token").and_then(Value::as_str).context("missing token")?.to_string())
    }

    pub async fn request(&self, req: Request<Body>) -> Result<Response> {
        Ok(self.app.clone().oneshot(req).await?)
    }

    pub async fn send(&self, req: Request<Body>) -> Result<(StatusCode, Value)> {
        let resp = self.request(req).await?;
        let status = resp.status();
        let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<Response> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.request(builder.body(Body::empty())?).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, payload: Value) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(payload.to_string()))?).await
    }
}

pub fn location(resp: &Response) -> Option<&str> {
    resp.headers().get("location").and_then(|v| v.to_str().ok())
}
