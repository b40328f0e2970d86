use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::admin::{
        InviteRequest, InviteResponse, ReactivateResponse, RevocationImpactResponse,
        RevokeResponse,
    },
    dtos::ErrorResponse,
    middleware::AuthUser,
    services::InviteDetails,
    utils::ValidatedJson,
    AppState,
};

/// Preview how many active invitees a revocation would affect
#[utoipa::path(
    get,
    path = "/users/{user_id}/revocation-impact",
    params(
        ("user_id" = Uuid, Path, description = "User to preview revocation for")
    ),
    responses(
        (status = 200, description = "Impact computed", body = RevocationImpactResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revocation_impact(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let affected_invitees = state
        .admin
        .revocation_impact(user_id)
        .await
        .map_err(AppError::from)?;
    Ok((
        StatusCode::OK,
        Json(RevocationImpactResponse { affected_invitees }),
    ))
}

/// Revoke a user's access
///
/// Invitees chained through the invite graph are not mutated here; they are
/// denied lazily at their next validation.
#[utoipa::path(
    post,
    path = "/users/{user_id}/revoke",
    params(
        ("user_id" = Uuid, Path, description = "User to revoke")
    ),
    responses(
        (status = 200, description = "Access revoked", body = RevokeResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let affected_invitees = state
        .admin
        .revoke_access(actor.0.sub, user_id)
        .await
        .map_err(AppError::from)?;
    Ok((
        StatusCode::OK,
        Json(RevokeResponse {
            affected_invitees,
            message: "Access revoked".to_string(),
        }),
    ))
}

/// Reactivate a revoked or lapsed user
#[utoipa::path(
    post,
    path = "/users/{user_id}/reactivate",
    params(
        ("user_id" = Uuid, Path, description = "User to reactivate")
    ),
    responses(
        (status = 200, description = "User reactivated", body = ReactivateResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reactivate(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .admin
        .reactivate_user(actor.0.sub, user_id)
        .await
        .map_err(AppError::from)?;
    Ok((
        StatusCode::OK,
        Json(ReactivateResponse {
            user: user.sanitized(),
        }),
    ))
}

/// Create an invitee
///
/// Guests spend an invite and pass their own window down; admins invite
/// freely. Everyone else is rejected.
#[utoipa::path(
    post,
    path = "/invites",
    request_body = InviteRequest,
    responses(
        (status = 201, description = "Invite created", body = InviteResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 403, description = "Role may not invite or no invites remaining", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Invites",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_invite(
    State(state): State<AppState>,
    actor: AuthUser,
    ValidatedJson(req): ValidatedJson<InviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invitee = state
        .admin
        .create_invite(
            actor.0.sub,
            InviteDetails {
                name: req.name,
                email: req.email,
                gates: req.gates,
            },
        )
        .await
        .map_err(AppError::from)?;

    let access_code = invitee.access_code.clone();
    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            user: invitee.sanitized(),
            access_code,
        }),
    ))
}
