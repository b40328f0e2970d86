//! Test helper module for access-service integration tests.
//!
//! Builds the full router against the in-memory credential store and the
//! mock actuator, so suites can drive the HTTP surface without PostgreSQL
//! or Home Assistant.

#![allow(dead_code)]

use access_service::{
    build_router,
    config::{
        AccessConfig, DatabaseConfig, Environment, HomeAssistantConfig, RateLimitConfig,
        SecurityConfig, SessionConfig, SwaggerConfig, SwaggerMode,
    },
    models::{Role, User, UserStatus},
    services::{
        AccessEvaluator, AdminService, AuditTrail, CredentialStore, GateActuator, MemoryStore,
        MockActuator, SessionService, SessionTokenService,
    },
    utils::{hash_password, Password},
    AppState,
};
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct horse battery";

pub fn test_config() -> AccessConfig {
    AccessConfig {
        common: service_core::config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "access-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused-in-tests".to_string(),
            max_connections: 1,
        },
        session: SessionConfig {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            token_ttl_hours: 24,
            poll_interval_seconds: 30,
            logout_grace_seconds: 3,
        },
        home_assistant: HomeAssistantConfig {
            base_url: "http://homeassistant.local:8123".to_string(),
            token: "unused".to_string(),
            request_timeout_seconds: 1,
            gate_entities: HashMap::from([
                ("north".to_string(), "switch.north_gate".to_string()),
                ("south".to_string(), "switch.south_gate".to_string()),
            ]),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            global_ip_limit: 1000,
            global_ip_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub actuator: Arc<MockActuator>,
    pub state: AppState,
}

pub async fn spawn_app() -> TestApp {
    let config = test_config();
    let memory = Arc::new(MemoryStore::new());
    let mock_actuator = Arc::new(MockActuator::new());

    let store: Arc<dyn CredentialStore> = memory.clone();
    let actuator: Arc<dyn GateActuator> = mock_actuator.clone();

    let tokens = SessionTokenService::new(&config.session);
    let evaluator = AccessEvaluator::new(store.clone());
    let audit = AuditTrail::new(store.clone());
    let sessions = SessionService::new(store.clone(), tokens.clone(), evaluator.clone(), audit.clone());
    let admin = AdminService::new(store.clone(), audit.clone());

    let login_rate_limiter = service_core::middleware::rate_limit::create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let ip_rate_limiter = service_core::middleware::rate_limit::create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );

    let state = AppState {
        config,
        store,
        tokens,
        evaluator,
        sessions,
        admin,
        audit,
        actuator,
        login_rate_limiter,
        ip_rate_limiter,
    };

    let router = build_router(state.clone())
        .await
        .expect("Failed to build router");

    TestApp {
        router,
        store: memory,
        actuator: mock_actuator,
        state,
    }
}

/// Seed an active, fully-registered user with TEST_PASSWORD.
pub fn seed_active_user(store: &MemoryStore, role: Role, gates: &[&str]) -> User {
    let mut user = User::new(
        "Test User".to_string(),
        format!("{}@example.com", Uuid::new_v4().simple()),
        role,
        gates.iter().map(|g| g.to_string()).collect(),
    );
    user.status = UserStatus::Active;
    user.password_hash = Some(
        hash_password(&Password::new(TEST_PASSWORD.to_string()))
            .expect("hashing test password")
            .into_string(),
    );
    store.seed_user(user.clone());
    user
}

/// Issue a session token for a seeded user directly through the codec.
pub fn issue_token(app: &TestApp, user: &User) -> String {
    app.state
        .tokens
        .issue(user.id, &user.email, user.role)
        .expect("issuing test token")
}

pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("building request")
}

pub fn authed_json_request(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .expect("building request")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("reading body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parsing body as JSON")
}

/// Wait out the fire-and-forget audit spawns before asserting on logs.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
