use access_service::{
    build_router,
    config::AccessConfig,
    services::{
        AccessEvaluator, AdminService, AuditTrail, CredentialStore, GateActuator,
        HomeAssistantActuator, PgStore, SessionService, SessionTokenService,
    },
    AppState,
};
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AccessConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting gate access service"
    );

    // Credential store
    let pool = access_service::db::create_pool(&config.database)
        .await
        .map_err(|e| service_core::error::AppError::DatabaseError(anyhow::anyhow!(e)))?;
    access_service::db::run_migrations(&pool)
        .await
        .map_err(|e| service_core::error::AppError::DatabaseError(anyhow::anyhow!(e)))?;
    let store: Arc<dyn CredentialStore> = Arc::new(PgStore::new(pool));
    store.health_check().await?;
    tracing::info!("Credential store initialized");

    // Gate actuator bridge
    let actuator: Arc<dyn GateActuator> = Arc::new(HomeAssistantActuator::new(&config.home_assistant)?);
    tracing::info!(
        gates = config.home_assistant.gate_entities.len(),
        "Gate actuator bridge initialized"
    );

    // Core services
    let tokens = SessionTokenService::new(&config.session);
    let evaluator = AccessEvaluator::new(store.clone());
    let audit = AuditTrail::new(store.clone());
    let sessions = SessionService::new(
        store.clone(),
        tokens.clone(),
        evaluator.clone(),
        audit.clone(),
    );
    let admin = AdminService::new(store.clone(), audit.clone());

    // Rate limiters
    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );
    tracing::info!("Rate limiters initialized: Login and Global IP");

    let state = AppState {
        config: config.clone(),
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

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
