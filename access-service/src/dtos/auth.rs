use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::UserResponse;
use crate::services::{DenialReason, SessionValidation};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email or national id.
    #[validate(length(min = 1, message = "Identifier is required"))]
    #[schema(example = "user@example.com")]
    pub identifier: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Body fallback for endpoints that normally read the bearer header.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSessionRequest {
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GateActionRequest {
    #[schema(example = "north")]
    pub gate_id: String,
    pub token: Option<String>,
    /// Optional client-reported geolocation, embedded in the audit entry.
    #[schema(example = "-23.5505,-46.6333")]
    pub geolocation: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub valid: bool,
    /// Stable denial code for client branching.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "WindowExpired")]
    pub reason: Option<String>,
    /// Human-readable copy for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

impl ValidationResponse {
    pub fn denied(reason: &DenialReason, user: Option<UserResponse>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.code().to_string()),
            message: Some(reason.message()),
            user,
        }
    }
}

impl From<SessionValidation> for ValidationResponse {
    fn from(v: SessionValidation) -> Self {
        match v.reason {
            Some(reason) => {
                ValidationResponse::denied(&reason, v.user.map(|u| u.sanitized()))
            }
            None => Self {
                valid: v.valid,
                reason: None,
                message: None,
                user: v.user.map(|u| u.sanitized()),
            },
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Access code is required"))]
    #[schema(example = "A1B2C3D4")]
    pub access_code: String,

    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Ana Souza")]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ana@example.com")]
    pub email: String,

    #[schema(example = "12345678900")]
    pub national_id: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "password123", min_length = 8)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserResponse,
    #[schema(example = "Registration completed. You can now log in.")]
    pub message: String,
}
