//! Access evaluator: the decision engine.
//!
//! Given a user snapshot and optionally a target gate, decides whether
//! access is valid right now and why not if it is not. Expected denials are
//! typed results, never errors; only store failures propagate as `Err`, and
//! callers must treat those as a third outcome (retry), not as a denial.

use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Role, User, UserStatus};
use crate::services::CredentialStore;

/// Upper bound on inviter-chain walks. The invite graph is a forest with
/// depth 1 in practice; anything deeper or cyclic is treated as an invalid
/// inviter rather than followed indefinitely.
const MAX_INVITER_DEPTH: usize = 5;

/// Why an access attempt was denied. Codes are stable strings the client
/// branches on; messages are the user-facing copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    NotFound,
    IncompleteRegistration,
    RegistrationPending,
    AccessExpired,
    NotYetStarted {
        starts: DateTime<Utc>,
        ends: DateTime<Utc>,
    },
    WindowExpired {
        starts: DateTime<Utc>,
        ends: DateTime<Utc>,
    },
    GateNotPermitted {
        gate: String,
    },
    InviterInvalid {
        /// The inviter's own denial, when one was resolvable. `None` means
        /// the chain itself was malformed (cycle or depth overflow).
        cause: Option<Box<DenialReason>>,
    },
    SessionInvalid,
    TokenExpired,
    TokenInvalid,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::NotFound => "NotFound",
            DenialReason::IncompleteRegistration => "IncompleteRegistration",
            DenialReason::RegistrationPending => "RegistrationPending",
            DenialReason::AccessExpired => "AccessExpired",
            DenialReason::NotYetStarted { .. } => "NotYetStarted",
            DenialReason::WindowExpired { .. } => "WindowExpired",
            DenialReason::GateNotPermitted { .. } => "GateNotPermitted",
            DenialReason::InviterInvalid { .. } => "InviterInvalid",
            DenialReason::SessionInvalid => "SessionInvalid",
            DenialReason::TokenExpired => "TokenExpired",
            DenialReason::TokenInvalid => "TokenInvalid",
        }
    }

    /// User-facing copy. Authorization denials are specific so the user
    /// knows what to do; token failures stay generic.
    pub fn message(&self) -> String {
        match self {
            DenialReason::NotFound => "User not found in the system.".to_string(),
            DenialReason::IncompleteRegistration => {
                "Registration is not complete. Finish your registration before requesting access."
                    .to_string()
            }
            DenialReason::RegistrationPending => {
                "Your registration is still pending. Complete the registration process."
                    .to_string()
            }
            DenialReason::AccessExpired => {
                "Your access has expired. Contact the administrator.".to_string()
            }
            DenialReason::NotYetStarted { starts, ends } => format!(
                "Your access window runs from {} to {} and has not started yet.",
                starts.format("%d/%m/%Y"),
                ends.format("%d/%m/%Y"),
            ),
            DenialReason::WindowExpired { starts, ends } => format!(
                "Your access window ran from {} to {} and has expired. Contact the administrator.",
                starts.format("%d/%m/%Y"),
                ends.format("%d/%m/%Y"),
            ),
            DenialReason::GateNotPermitted { .. } => {
                "You do not have permission to operate this gate.".to_string()
            }
            DenialReason::InviterInvalid { .. } => {
                "The guest who invited you no longer has valid access.".to_string()
            }
            DenialReason::SessionInvalid
            | DenialReason::TokenExpired
            | DenialReason::TokenInvalid => "Session expired. Log in again.".to_string(),
        }
    }
}

/// Outcome of an evaluation. `Denied` still carries the loaded snapshot when
/// one was resolvable, so denials stay attributable and auditable.
#[derive(Debug, Clone)]
pub enum Verdict {
    Granted(User),
    Denied {
        user: Option<User>,
        reason: DenialReason,
    },
}

impl Verdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, Verdict::Granted(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Verdict::Granted(user) => Some(user),
            Verdict::Denied { user, .. } => user.as_ref(),
        }
    }
}

#[derive(Clone)]
pub struct AccessEvaluator {
    store: Arc<dyn CredentialStore>,
}

impl AccessEvaluator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Evaluate a user's access as of `now`, optionally against a target
    /// gate. First failing check wins:
    ///
    /// 1. existence
    /// 2. registration completeness
    /// 3. status
    /// 4. temporal window (expiry here also persists `status = Expired`)
    /// 5. gate entitlement (only when a gate is supplied)
    /// 6. inviter chain (only for invitees)
    pub async fn evaluate(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        target_gate: Option<&str>,
    ) -> Result<Verdict, AppError> {
        let Some(user) = self.store.find_user_by_id(user_id).await? else {
            tracing::debug!(user_id = %user_id, "Evaluation failed: user not found");
            return Ok(Verdict::Denied {
                user: None,
                reason: DenialReason::NotFound,
            });
        };
        self.evaluate_user(user, now, target_gate).await
    }

    /// Same as [`evaluate`](Self::evaluate) for an already-loaded snapshot.
    pub async fn evaluate_user(
        &self,
        user: User,
        now: DateTime<Utc>,
        target_gate: Option<&str>,
    ) -> Result<Verdict, AppError> {
        // Checks 2-4, shared between session-level and action-level calls.
        if let Some(reason) = self.check_core(&user, now).await? {
            tracing::debug!(user_id = %user.id, reason = reason.code(), "Access denied");
            return Ok(Verdict::Denied {
                user: Some(user),
                reason,
            });
        }

        // Check 5: gate entitlement. An empty set always fails.
        if let Some(gate) = target_gate {
            if !user.accessible_gates.iter().any(|g| g == gate) {
                tracing::debug!(user_id = %user.id, gate = gate, "Gate not permitted");
                return Ok(Verdict::Denied {
                    user: Some(user),
                    reason: DenialReason::GateNotPermitted {
                        gate: gate.to_string(),
                    },
                });
            }
        }

        // Check 6: an invitee is never more valid than their inviter.
        if user.role == Role::Invitee {
            if let Some(inviter_id) = user.invited_by_id {
                if let Some(reason) = self.check_inviter_chain(user.id, inviter_id, now).await? {
                    tracing::debug!(user_id = %user.id, reason = reason.code(), "Inviter chain invalid");
                    return Ok(Verdict::Denied {
                        user: Some(user),
                        reason,
                    });
                }
            }
        }

        Ok(Verdict::Granted(user))
    }

    /// Checks 2-4 over a loaded snapshot. A window that has lapsed persists
    /// the `Expired` transition; the write is idempotent, so repeated
    /// evaluations after the first simply hit the status check instead.
    async fn check_core(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<Option<DenialReason>, AppError> {
        if user.password_hash.is_none() {
            return Ok(Some(DenialReason::IncompleteRegistration));
        }

        match user.status {
            UserStatus::Pending => return Ok(Some(DenialReason::RegistrationPending)),
            UserStatus::Expired => return Ok(Some(DenialReason::AccessExpired)),
            UserStatus::Active => {}
        }

        if let (Some(starts), Some(ends)) = (user.access_start, user.access_end) {
            if now < starts {
                return Ok(Some(DenialReason::NotYetStarted { starts, ends }));
            }
            if now > ends {
                self.store
                    .update_user_status(user.id, UserStatus::Expired)
                    .await?;
                tracing::info!(user_id = %user.id, "Access window lapsed, status set to expired");
                return Ok(Some(DenialReason::WindowExpired { starts, ends }));
            }
        }

        Ok(None)
    }

    /// Walk the `invited_by_id` chain, running checks 1-4 on each inviter.
    /// Depth-bounded with cycle detection; a malformed chain denies instead
    /// of looping.
    async fn check_inviter_chain(
        &self,
        origin: Uuid,
        first_inviter: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<DenialReason>, AppError> {
        let mut visited = vec![origin];
        let mut next = Some(first_inviter);
        let mut depth = 0;

        while let Some(inviter_id) = next {
            if depth >= MAX_INVITER_DEPTH || visited.contains(&inviter_id) {
                tracing::warn!(
                    user_id = %origin,
                    inviter_id = %inviter_id,
                    depth,
                    "Malformed invite chain"
                );
                return Ok(Some(DenialReason::InviterInvalid { cause: None }));
            }
            visited.push(inviter_id);
            depth += 1;

            let Some(inviter) = self.store.find_user_by_id(inviter_id).await? else {
                return Ok(Some(DenialReason::InviterInvalid {
                    cause: Some(Box::new(DenialReason::NotFound)),
                }));
            };

            if let Some(cause) = self.check_core(&inviter, now).await? {
                return Ok(Some(DenialReason::InviterInvalid {
                    cause: Some(Box::new(cause)),
                }));
            }

            next = match inviter.role {
                Role::Invitee => inviter.invited_by_id,
                _ => None,
            };
        }

        Ok(None)
    }
}
