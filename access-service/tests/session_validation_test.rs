mod common;

use access_service::models::{Role, UserStatus};
use access_service::services::CredentialStore;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::*;
use tower::util::ServiceExt;

#[tokio::test]
async fn test_valid_session_returns_user() {
    let app = spawn_app().await;
    let user = seed_active_user(&app.store, Role::Family, &["north"]);
    let token = issue_token(&app, &user);

    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            "/auth/validate-session",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["id"], user.id.to_string());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_token_accepted_from_json_body_fallback() {
    let app = spawn_app().await;
    let user = seed_active_user(&app.store, Role::Guest, &["north"]);
    let token = issue_token(&app, &user);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/validate-session",
            serde_json::json!({ "token": token }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request("/auth/validate-session", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_forbidden_with_stable_code() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/validate-session",
            serde_json::json!({ "token": "not-a-real-token" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "TokenInvalid");
}

#[tokio::test]
async fn test_revoked_user_fails_next_poll() {
    let app = spawn_app().await;
    let user = seed_active_user(&app.store, Role::Guest, &["north"]);
    let token = issue_token(&app, &user);

    // First poll is fine.
    let ok = app
        .router
        .clone()
        .oneshot(authed_json_request(
            "/auth/validate-session",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    // Admin revokes mid-session. The token still verifies; the record does
    // not.
    app.store.revoke_user(user.id, Utc::now()).await.unwrap();

    let denied = app
        .router
        .clone()
        .oneshot(authed_json_request(
            "/auth/validate-session",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    let body = body_json(denied).await;
    assert_eq!(body["reason"], "AccessExpired");
    assert!(body["message"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn test_window_expiry_persists_status_transition() {
    let app = spawn_app().await;
    let now = Utc::now();
    let mut user = seed_active_user(&app.store, Role::Guest, &["north"]);
    user.access_start = Some(now - Duration::days(3));
    user.access_end = Some(now - Duration::days(1));
    app.store.seed_user(user.clone());
    let token = issue_token(&app, &user);

    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            "/auth/validate-session",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["reason"], "WindowExpired");
    assert_eq!(app.store.user(user.id).unwrap().status, UserStatus::Expired);

    // Second validation reports the persisted state instead.
    let again = app
        .router
        .clone()
        .oneshot(authed_json_request(
            "/auth/validate-session",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let body = body_json(again).await;
    assert_eq!(body["reason"], "AccessExpired");
}

#[tokio::test]
async fn test_store_outage_is_a_server_error_not_a_denial() {
    let app = spawn_app().await;
    let user = seed_active_user(&app.store, Role::Family, &[]);
    let token = issue_token(&app, &user);

    app.store.set_failing(true);

    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            "/auth/validate-session",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
