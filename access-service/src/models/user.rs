//! User model - gate accessors and their entitlements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Accessor roles. Controls default gate entitlement scope and
/// invite-issuing rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Family,
    Guest,
    Invitee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Family => "family",
            Role::Guest => "guest",
            Role::Invitee => "invitee",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "family" => Ok(Role::Family),
            "guest" => Ok(Role::Guest),
            "invitee" => Ok(Role::Invitee),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// User lifecycle states. Mutated only by the access evaluator (expiry
/// detection) or by explicit admin action (revoke/reactivate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Pending,
    Expired,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Pending => "pending",
            UserStatus::Expired => "expired",
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "pending" => Ok(UserStatus::Pending),
            "expired" => Ok(UserStatus::Expired),
            other => Err(format!("Invalid user status: {}", other)),
        }
    }
}

/// User entity.
///
/// `access_start`/`access_end` are either both `None` (permanent access,
/// typical for Admin/Family) or both set (bounded window). A missing
/// `password_hash` means registration is incomplete and access is denied
/// regardless of the other fields.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub national_id: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub access_start: Option<DateTime<Utc>>,
    pub access_end: Option<DateTime<Utc>>,
    pub access_code: String,
    pub password_hash: Option<String>,
    pub accessible_gates: Vec<String>,
    pub invited_by_id: Option<Uuid>,
    pub invites_remaining: i32,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id and a generated access code.
    pub fn new(name: String, email: String, role: Role, accessible_gates: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            national_id: None,
            role,
            status: UserStatus::Pending,
            access_start: None,
            access_end: None,
            access_code: generate_access_code(),
            password_hash: None,
            accessible_gates,
            invited_by_id: None,
            invites_remaining: 0,
            created_utc: Utc::now(),
        }
    }

    /// Whether the user has a bounded access window.
    pub fn has_window(&self) -> bool {
        self.access_start.is_some() && self.access_end.is_some()
    }

    /// Convert to sanitized response (no credential fields).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// Generate a short unique invite/login code.
pub fn generate_access_code() -> String {
    use rand::Rng;
    let bytes: [u8; 4] = rand::thread_rng().gen();
    hex::encode(bytes).to_uppercase()
}

/// User response for API (without credential fields).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub access_start: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub access_end: Option<DateTime<Utc>>,
    pub accessible_gates: Vec<String>,
    pub invites_remaining: i32,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            status: u.status,
            access_start: u.access_start,
            access_end: u.access_end,
            accessible_gates: u.accessible_gates,
            invites_remaining: u.invites_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Family, Role::Guest, Role::Invitee] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [UserStatus::Active, UserStatus::Pending, UserStatus::Expired] {
            assert_eq!(status.as_str().parse::<UserStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_new_user_starts_pending_without_credentials() {
        let user = User::new(
            "Ana".to_string(),
            "ana@example.com".to_string(),
            Role::Guest,
            vec!["north".to_string()],
        );
        assert_eq!(user.status, UserStatus::Pending);
        assert!(user.password_hash.is_none());
        assert!(!user.access_code.is_empty());
        assert!(!user.has_window());
    }

    #[test]
    fn test_sanitized_drops_credentials() {
        let mut user = User::new(
            "Ana".to_string(),
            "ana@example.com".to_string(),
            Role::Family,
            vec![],
        );
        user.password_hash = Some("$argon2id$fake".to_string());
        let response = serde_json::to_value(user.sanitized()).unwrap();
        assert!(response.get("password_hash").is_none());
        assert!(response.get("access_code").is_none());
    }
}
