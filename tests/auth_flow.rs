mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use common::{spawn_app, PASSWORD};
use site_cms::authz::Role;

#[tokio::test]
async fn login_rejects_bad_credentials() -> Result<()> {
    let t = spawn_app().await?;
    t.staff("valid@example.com", Some(Role::Editor)).await?;

    // 1. Wrong password
    let (status, _) = t
        .post_json("/auth/login", None, json!({ "email": "valid@example.com", "password": "wrongpassword" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "wrong password must be rejected");

    // 2. Unknown email
    let (status, _) = t
        .post_json("/auth/login", None, json!({ "email": "nobody@example.com", "password": PASSWORD }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "unknown email must be rejected");

    // 3. Email matching is case-insensitive
    let (status, body) = t
        .post_json("/auth/login", None, json!({ "email": "Valid@Example.com", "password": PASSWORD }))
        .await?;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    Ok(())
}

#[tokio::test]
async fn first_sign_in_creates_viewer_profile() -> Result<()> {
    let t = spawn_app().await?;
    t.staff("newcomer@example.com", None).await?;

    let token = t.login("newcomer@example.com").await?;

    let (status, me) = t
        .send(
            Request::builder()
                .uri("/auth/me")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "viewer");
    assert_eq!(me["profile"]["email"], "newcomer@example.com");
    assert_eq!(me["profile"]["full_name"], "Test Staff");
    assert_eq!(me["permissions"], json!(["view_content"]));

    Ok(())
}

#[tokio::test]
async fn sign_in_keeps_existing_role() -> Result<()> {
    let t = spawn_app().await?;
    t.staff("editor@example.com", Some(Role::Editor)).await?;

    let token = t.login("editor@example.com").await?;
    let (status, me) = t
        .send(
            Request::builder()
                .uri("/auth/me")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "editor");
    assert_eq!(
        me["permissions"],
        json!(["create_content", "edit_content", "delete_content", "view_content"])
    );
    assert!(me["user"].get("role").is_none(), "session user must not carry a role");

    Ok(())
}

#[tokio::test]
async fn me_requires_a_valid_session() -> Result<()> {
    let t = spawn_app().await?;

    let (status, body) = t.send(Request::builder().uri("/auth/me").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = t
        .send(
            Request::builder()
                .uri("/auth/me")
                .header("authorization", "Bearer not-a-token")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn session_cookie_round_trip() -> Result<()> {
    let t = spawn_app().await?;
    t.staff("cookie@example.com", Some(Role::Admin)).await?;

    let resp = t
        .request(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "email": "cookie@example.com", "password": PASSWORD }).to_string(),
                ))?,
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let set_cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("login sets the session cookie")
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    let pair = set_cookie.split(';').next().unwrap_or_default().to_string();

    let resp = t
        .request(Request::builder().uri("/admin/users").header("cookie", pair).body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = t
        .request(Request::builder().method("POST").uri("/auth/logout").body(Body::empty())?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp.headers().get("set-cookie").and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cleared.contains("Max-Age=0"));

    Ok(())
}
