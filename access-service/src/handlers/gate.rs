use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::auth::{GateActionRequest, ValidationResponse},
    dtos::ErrorResponse,
    handlers::bearer_token,
    AppState,
};

/// Validate access to a gate and trigger its actuator
///
/// Denials are audit-logged by the validation service; a grant actuates the
/// gate and only then records the trigger, so a failed actuation shows up
/// as an attempted-but-failed entry rather than a success or a denial.
#[utoipa::path(
    post,
    path = "/access/validate",
    request_body = GateActionRequest,
    responses(
        (status = 200, description = "Access granted, gate triggered", body = ValidationResponse),
        (status = 401, description = "No session token provided", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ValidationResponse),
        (status = 502, description = "Actuator unreachable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Access",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn validate_gate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GateActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(token) = bearer_token(&headers, req.token) else {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Session token not provided"
        )));
    };

    let validation = state
        .sessions
        .validate_gate_action(&token, &req.gate_id)
        .await?;

    if !validation.valid {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(ValidationResponse::from(validation)),
        ));
    }

    let Some(user) = validation.user.as_ref() else {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "granted validation did not carry a user record"
        )));
    };

    if let Err(e) = state.actuator.trigger(&req.gate_id).await {
        tracing::error!(
            user_id = %user.id,
            gate_id = %req.gate_id,
            error = %e,
            "Gate actuation failed after successful validation"
        );
        state
            .audit
            .gate_trigger_failed(user.id, &req.gate_id, &e.to_string());
        return Err(e);
    }

    state
        .audit
        .gate_triggered(user.id, &req.gate_id, req.geolocation.as_deref());

    Ok((StatusCode::OK, Json(ValidationResponse::from(validation))))
}
