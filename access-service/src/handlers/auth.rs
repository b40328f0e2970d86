use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::auth::{LoginRequest, LoginResponse, ValidateSessionRequest, ValidationResponse},
    dtos::ErrorResponse,
    handlers::bearer_token,
    utils::ValidatedJson,
    AppState,
};

/// Login with email or national id plus password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .sessions
        .login(&req.identifier, &req.password)
        .await
        .map_err(AppError::from)?;
    Ok((StatusCode::OK, Json(LoginResponse { token })))
}

/// Validate the current session against the live user record
#[utoipa::path(
    post,
    path = "/auth/validate-session",
    request_body = ValidateSessionRequest,
    responses(
        (status = 200, description = "Session is valid", body = ValidationResponse),
        (status = 401, description = "No session token provided", body = ErrorResponse),
        (status = 403, description = "Session is no longer valid", body = ValidationResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn validate_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<ValidateSessionRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let body_token = body.and_then(|Json(req)| req.token);
    let Some(token) = bearer_token(&headers, body_token) else {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Session token not provided"
        )));
    };

    let validation = state.sessions.validate_session(&token).await?;
    let status = if validation.valid {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };
    Ok((status, Json(ValidationResponse::from(validation))))
}
