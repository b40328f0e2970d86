use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    dtos::ErrorResponse,
    models::Role,
    services::{SessionClaims, Verdict},
    AppState,
};

/// Guard for administrative routes. Runs after [`auth_middleware`]: the
/// claims must carry the Admin role AND the admin's own record must still
/// evaluate as valid, so a revoked admin's leftover token is caught on the
/// next request rather than at natural token expiry.
pub async fn admin_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let claims = req.extensions().get::<SessionClaims>().cloned().ok_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Auth claims missing from request extensions".to_string(),
        }),
    ))?;

    if claims.role != Role::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Administrator access required".to_string(),
            }),
        ));
    }

    let verdict = state
        .evaluator
        .evaluate(claims.sub, Utc::now(), None)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Admin re-validation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Try again later".to_string(),
                }),
            )
        })?;

    match verdict {
        Verdict::Granted(_) => Ok(next.run(req).await),
        Verdict::Denied { reason, .. } => {
            tracing::warn!(
                user_id = %claims.sub,
                reason = reason.code(),
                "Admin token presented by an account that no longer validates"
            );
            Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: reason.message(),
                }),
            ))
        }
    }
}
