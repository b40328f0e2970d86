use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::models::Role;

/// Claims carried by a session token. Not persisted server-side; expiry is
/// the only server-enforced bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email
    pub email: String,
    /// Role at issuance time
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Token verification failures. Both generally mean "log in again", but
/// callers can tell them apart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Session token expired")]
    Expired,
    #[error("Session token invalid")]
    Invalid,
}

/// Issues and verifies signed session tokens without server-side state.
#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_hours: i64,
}

impl SessionTokenService {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            token_ttl_hours: config.token_ttl_hours,
        }
    }

    /// Issue a signed token binding the user identity to an expiry a fixed
    /// duration from now. Pure: no side effects.
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, anyhow::Error> {
        self.issue_with_ttl(user_id, email, role, Duration::hours(self.token_ttl_hours))
    }

    fn issue_with_ttl(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> SessionTokenService {
        SessionTokenService::new(&SessionConfig {
            secret: "test-secret-key-that-is-long-enough".to_string(),
            token_ttl_hours: 24,
            poll_interval_seconds: 30,
            logout_grace_seconds: 3,
        })
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service
            .issue(user_id, "ana@example.com", Role::Guest)
            .unwrap();
        assert!(!token.is_empty());

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, Role::Guest);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_is_distinguishable() {
        let service = test_service();
        let token = service
            .issue_with_ttl(
                Uuid::new_v4(),
                "ana@example.com",
                Role::Guest,
                Duration::hours(-1),
            )
            .unwrap();

        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let service = test_service();
        let token = service
            .issue(Uuid::new_v4(), "ana@example.com", Role::Guest)
            .unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(service.verify(&tampered), Err(TokenError::Invalid));

        assert_eq!(service.verify("not-a-token"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_foreign_signature_is_invalid() {
        let service = test_service();
        let other = SessionTokenService::new(&SessionConfig {
            secret: "a-completely-different-signing-secret".to_string(),
            token_ttl_hours: 24,
            poll_interval_seconds: 30,
            logout_grace_seconds: 3,
        });

        let token = other
            .issue(Uuid::new_v4(), "ana@example.com", Role::Admin)
            .unwrap();
        assert_eq!(service.verify(&token), Err(TokenError::Invalid));
    }
}
