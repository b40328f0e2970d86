use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{RegisterRequest, RegisterResponse},
    dtos::ErrorResponse,
    utils::ValidatedJson,
    AppState,
};

/// Complete a registration using an invite code
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration completed", body = RegisterResponse),
        (status = 404, description = "Invite code not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .admin
        .complete_registration(
            &req.access_code,
            &req.name,
            &req.email,
            req.national_id.as_deref(),
            &req.password,
        )
        .await
        .map_err(AppError::from)?;

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            user: user.sanitized(),
            message: "Registration completed. You can now log in.".to_string(),
        }),
    ))
}
