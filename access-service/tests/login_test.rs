mod common;

use axum::http::StatusCode;
use common::*;
use access_service::models::Role;
use tower::util::ServiceExt;

#[tokio::test]
async fn test_login_returns_token() {
    let app = spawn_app().await;
    let user = seed_active_user(&app.store, Role::Family, &["north"]);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/login",
            serde_json::json!({ "identifier": user.email, "password": TEST_PASSWORD }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["token"].as_str().unwrap().split('.').count() == 3);
}

#[tokio::test]
async fn test_login_by_national_id() {
    let app = spawn_app().await;
    let mut user = seed_active_user(&app.store, Role::Guest, &["north"]);
    user.national_id = Some("98765432100".to_string());
    app.store.seed_user(user);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/login",
            serde_json::json!({ "identifier": "98765432100", "password": TEST_PASSWORD }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_share_one_error_body() {
    let app = spawn_app().await;
    let user = seed_active_user(&app.store, Role::Family, &[]);

    // Wrong password.
    let wrong_password = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/login",
            serde_json::json!({ "identifier": user.email, "password": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body = body_json(wrong_password).await;

    // Unknown identifier.
    let unknown = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/login",
            serde_json::json!({ "identifier": "nobody@example.com", "password": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = body_json(unknown).await;

    // The copy never reveals which part was wrong.
    assert_eq!(wrong_password_body["error"], unknown_body["error"]);
}

#[tokio::test]
async fn test_login_requires_identifier_and_password() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/login",
            serde_json::json!({ "identifier": "", "password": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
