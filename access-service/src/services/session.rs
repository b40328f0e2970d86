//! Session validation service: the bridge between an inbound bearer token
//! and the access evaluator. This is the contract clients consume, both on
//! login and on every re-validation while a session is displayed as active.

use chrono::Utc;
use service_core::error::AppError;
use std::sync::Arc;

use crate::models::User;
use crate::services::{
    AccessEvaluator, AuditTrail, CredentialStore, DenialReason, ServiceError,
    SessionTokenService, TokenError, Verdict,
};
use crate::utils::{verify_password, Password, PasswordHashString};

/// Outcome of a session or gate-action validation.
#[derive(Debug, Clone)]
pub struct SessionValidation {
    pub valid: bool,
    pub user: Option<User>,
    pub reason: Option<DenialReason>,
}

impl SessionValidation {
    fn granted(user: User) -> Self {
        Self {
            valid: true,
            user: Some(user),
            reason: None,
        }
    }

    fn denied(user: Option<User>, reason: DenialReason) -> Self {
        Self {
            valid: false,
            user,
            reason: Some(reason),
        }
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    tokens: SessionTokenService,
    evaluator: AccessEvaluator,
    audit: AuditTrail,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: SessionTokenService,
        evaluator: AccessEvaluator,
        audit: AuditTrail,
    ) -> Self {
        Self {
            store,
            tokens,
            evaluator,
            audit,
        }
    }

    /// Login with email or national id plus password. Every failure mode
    /// collapses into the same generic credential error; the specifics are
    /// only logged server-side.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<String, ServiceError> {
        let user = self.store.find_user_by_identifier(identifier).await?;

        let user = match user {
            Some(user) => user,
            None => {
                tracing::debug!(identifier = %identifier, "Login attempt with unknown identifier");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let Some(hash) = user.password_hash.clone() else {
            tracing::debug!(user_id = %user.id, "Login attempt before registration completed");
            return Err(ServiceError::InvalidCredentials);
        };

        verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(hash),
        )
        .map_err(|_| {
            tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
            ServiceError::InvalidCredentials
        })?;

        let token = self
            .tokens
            .issue(user.id, &user.email, user.role)
            .map_err(ServiceError::Internal)?;

        tracing::info!(user_id = %user.id, "Login successful");
        Ok(token)
    }

    /// Verify the token, load the current user record, and evaluate access
    /// with no target gate. Token failures never touch the store.
    pub async fn validate_session(&self, token: &str) -> Result<SessionValidation, AppError> {
        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => return Ok(SessionValidation::denied(None, token_denial(e))),
        };

        let verdict = self.evaluator.evaluate(claims.sub, Utc::now(), None).await?;
        Ok(match verdict {
            Verdict::Granted(user) => SessionValidation::granted(user),
            Verdict::Denied { user, reason } => {
                if let Some(ref user) = user {
                    self.audit.access_denied(user.id, &reason, None);
                }
                SessionValidation::denied(user, reason)
            }
        })
    }

    /// Action-level validation against a specific gate. Denials with a
    /// resolvable user record are audit-logged here; successes are logged
    /// by the caller only after the physical actuation completes.
    pub async fn validate_gate_action(
        &self,
        token: &str,
        gate_id: &str,
    ) -> Result<SessionValidation, AppError> {
        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => return Ok(SessionValidation::denied(None, token_denial(e))),
        };

        let verdict = self
            .evaluator
            .evaluate(claims.sub, Utc::now(), Some(gate_id))
            .await?;

        Ok(match verdict {
            Verdict::Granted(user) => SessionValidation::granted(user),
            Verdict::Denied { user, reason } => {
                if let Some(ref user) = user {
                    self.audit.access_denied(user.id, &reason, Some(gate_id));
                }
                SessionValidation::denied(user, reason)
            }
        })
    }
}

fn token_denial(error: TokenError) -> DenialReason {
    match error {
        TokenError::Expired => DenialReason::TokenExpired,
        TokenError::Invalid => DenialReason::TokenInvalid,
    }
}
