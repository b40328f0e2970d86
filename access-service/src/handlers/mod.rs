pub mod admin;
pub mod auth;
pub mod gate;
pub mod registration;

use axum::http::{header, HeaderMap};

/// Session token extraction: `Authorization: Bearer <token>` header first,
/// JSON body field as the fallback.
pub(crate) fn bearer_token(headers: &HeaderMap, body_token: Option<String>) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or(body_token)
}
