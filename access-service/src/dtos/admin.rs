use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::UserResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Carlos Lima")]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "carlos@example.com")]
    pub email: String,

    /// Gate ids the invitee should be able to actuate; capped at the
    /// inviter's own entitlement for guests.
    #[schema(example = json!(["north"]))]
    pub gates: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub user: UserResponse,
    /// Code the invitee uses to complete registration.
    #[schema(example = "A1B2C3D4")]
    pub access_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevocationImpactResponse {
    /// Currently-active invitees that would lose access.
    #[schema(example = 2)]
    pub affected_invitees: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeResponse {
    pub affected_invitees: u64,
    #[schema(example = "Access revoked")]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReactivateResponse {
    pub user: UserResponse,
}
