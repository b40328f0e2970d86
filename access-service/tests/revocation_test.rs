mod common;

use access_service::models::{Role, UserStatus};
use access_service::services::audit::ACTION_ACCESS_REVOKED;
use axum::{body::Body, http::Request, http::StatusCode};
use common::*;
use tower::util::ServiceExt;

fn impact_request(user_id: uuid::Uuid, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(format!("/users/{}/revocation-impact", user_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_revocation_reports_impact_and_cascades_lazily() {
    let app = spawn_app().await;
    let admin = seed_active_user(&app.store, Role::Admin, &[]);
    let guest = seed_active_user(&app.store, Role::Guest, &["north"]);
    let mut invitee = seed_active_user(&app.store, Role::Invitee, &["north"]);
    invitee.invited_by_id = Some(guest.id);
    app.store.seed_user(invitee.clone());

    let admin_token = issue_token(&app, &admin);
    let invitee_token = issue_token(&app, &invitee);

    // Preview before confirming.
    let preview = app
        .router
        .clone()
        .oneshot(impact_request(guest.id, &admin_token))
        .await
        .unwrap();
    assert_eq!(preview.status(), StatusCode::OK);
    assert_eq!(body_json(preview).await["affectedInvitees"], 1);

    // Revoke the guest.
    let revoke = app
        .router
        .clone()
        .oneshot(authed_json_request(
            &format!("/users/{}/revoke", guest.id),
            &admin_token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(revoke.status(), StatusCode::OK);
    assert_eq!(body_json(revoke).await["affectedInvitees"], 1);

    // The guest is expired; the invitee record is untouched.
    assert_eq!(app.store.user(guest.id).unwrap().status, UserStatus::Expired);
    assert_eq!(
        app.store.user(invitee.id).unwrap().status,
        UserStatus::Active
    );

    // But the invitee's next validation discovers the invalid inviter.
    let validation = app
        .router
        .clone()
        .oneshot(authed_json_request(
            "/auth/validate-session",
            &invitee_token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(validation.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(validation).await["reason"], "InviterInvalid");

    // The revocation entry is attributed to the acting admin, not a
    // placeholder.
    settle().await;
    let logs = app.store.logs();
    let revocation_log = logs
        .iter()
        .find(|l| l.action == ACTION_ACCESS_REVOKED)
        .expect("revocation audit entry");
    assert_eq!(revocation_log.user_id, admin.id);
}

#[tokio::test]
async fn test_non_admin_cannot_revoke() {
    let app = spawn_app().await;
    let guest = seed_active_user(&app.store, Role::Guest, &["north"]);
    let target = seed_active_user(&app.store, Role::Invitee, &[]);
    let token = issue_token(&app, &guest);

    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            &format!("/users/{}/revoke", target.id),
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.user(target.id).unwrap().status, UserStatus::Active);
}

#[tokio::test]
async fn test_revoked_admin_token_is_rejected_by_the_guard() {
    let app = spawn_app().await;
    let admin = seed_active_user(&app.store, Role::Admin, &[]);
    let target = seed_active_user(&app.store, Role::Guest, &[]);
    let token = issue_token(&app, &admin);

    // The admin is revoked after their token was issued.
    app.store
        .seed_user({
            let mut revoked = admin.clone();
            revoked.status = UserStatus::Expired;
            revoked
        });

    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            &format!("/users/{}/revoke", target.id),
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.user(target.id).unwrap().status, UserStatus::Active);
}

#[tokio::test]
async fn test_reactivation_restores_access() {
    let app = spawn_app().await;
    let admin = seed_active_user(&app.store, Role::Admin, &[]);
    let mut guest = seed_active_user(&app.store, Role::Guest, &["north"]);
    guest.status = UserStatus::Expired;
    app.store.seed_user(guest.clone());

    let admin_token = issue_token(&app, &admin);

    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            &format!("/users/{}/reactivate", guest.id),
            &admin_token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["status"], "active");
    assert_eq!(app.store.user(guest.id).unwrap().status, UserStatus::Active);
}

#[tokio::test]
async fn test_revoking_unknown_user_is_not_found() {
    let app = spawn_app().await;
    let admin = seed_active_user(&app.store, Role::Admin, &[]);
    let admin_token = issue_token(&app, &admin);

    let response = app
        .router
        .clone()
        .oneshot(authed_json_request(
            &format!("/users/{}/revoke", uuid::Uuid::new_v4()),
            &admin_token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
