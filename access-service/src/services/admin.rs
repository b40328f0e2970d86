//! Administrative operations over the invite graph: revocation (with its
//! lazy cascade), reactivation, invite issuing, and registration completion.
//!
//! Revocation deliberately does NOT mutate invitees. Each invitee's next
//! evaluation discovers the invalid inviter, which keeps revocation O(1);
//! the cost is paid at validation time, which already runs on every access
//! attempt. The only eager work is the informational impact count an admin
//! sees before confirming.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Role, User, UserStatus};
use crate::services::{AuditTrail, CredentialStore, ServiceError};
use crate::utils::{hash_password, Password};

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn CredentialStore>,
    audit: AuditTrail,
}

/// Invite creation input, already validated at the DTO boundary.
pub struct InviteDetails {
    pub name: String,
    pub email: String,
    pub gates: Vec<String>,
}

impl AdminService {
    pub fn new(store: Arc<dyn CredentialStore>, audit: AuditTrail) -> Self {
        Self { store, audit }
    }

    /// Count of currently-active invitees that a revocation of `user_id`
    /// would affect, so the admin can decide before confirming.
    pub async fn revocation_impact(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let invitees = self.store.list_invitees_of(user_id).await?;
        Ok(invitees
            .iter()
            .filter(|u| u.status != UserStatus::Expired)
            .count() as u64)
    }

    /// Revoke a user's access: status to Expired, window closed at now.
    /// Returns the affected-invitee count. Attributed to the acting admin.
    pub async fn revoke_access(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let affected = self.revocation_impact(user_id).await?;
        self.store.revoke_user(user_id, Utc::now()).await?;

        tracing::info!(
            user_id = %user_id,
            actor_id = %actor_id,
            affected_invitees = affected,
            "Access revoked"
        );
        self.audit.access_revoked(actor_id, &user.name, affected);

        Ok(affected)
    }

    /// Put a revoked or lapsed user back into the Active state. Attributed
    /// to the acting admin.
    pub async fn reactivate_user(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
    ) -> Result<User, ServiceError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        self.store
            .update_user_status(user_id, UserStatus::Active)
            .await?;

        tracing::info!(user_id = %user_id, actor_id = %actor_id, "User reactivated");
        self.audit.user_reactivated(actor_id, &user.name);

        let mut user = user;
        user.status = UserStatus::Active;
        Ok(user)
    }

    /// Create an invitee on behalf of `actor_id`.
    ///
    /// Guests spend their invite counter and pass their own access window
    /// down; the invitee's gates are capped at the inviter's entitlement.
    /// Admins invite without a counter and without a cap.
    pub async fn create_invite(
        &self,
        actor_id: Uuid,
        details: InviteDetails,
    ) -> Result<User, ServiceError> {
        let actor = self
            .store
            .find_user_by_id(actor_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let gates = match actor.role {
            Role::Admin => details.gates,
            Role::Guest => {
                if actor.invites_remaining <= 0 {
                    return Err(ServiceError::InvitesExhausted);
                }
                details.gates
                    .into_iter()
                    .filter(|g| actor.accessible_gates.contains(g))
                    .collect()
            }
            Role::Family | Role::Invitee => return Err(ServiceError::NotPermitted),
        };

        let mut invitee = User::new(details.name, details.email, Role::Invitee, gates);
        invitee.invited_by_id = Some(actor_id);
        if actor.role == Role::Guest {
            // A guest's invitees live inside the guest's own window.
            invitee.access_start = actor.access_start;
            invitee.access_end = actor.access_end;
        }

        self.store.insert_user(&invitee).await?;
        if actor.role == Role::Guest {
            self.store.decrement_invites(actor_id).await?;
        }

        tracing::info!(
            invitee_id = %invitee.id,
            actor_id = %actor_id,
            "Invite created"
        );
        self.audit.invite_created(actor_id, &invitee.name);

        Ok(invitee)
    }

    /// Bind a not-yet-onboarded user to their credential via the unique
    /// access code, activating the account.
    pub async fn complete_registration(
        &self,
        access_code: &str,
        name: &str,
        email: &str,
        national_id: Option<&str>,
        password: &str,
    ) -> Result<User, ServiceError> {
        let user = self
            .store
            .find_user_by_access_code(access_code)
            .await?
            .ok_or(ServiceError::AccessCodeNotFound)?;

        let password_hash = hash_password(&Password::new(password.to_string()))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        self.store
            .complete_registration(user.id, name, email, national_id, password_hash.as_str())
            .await?;

        tracing::info!(user_id = %user.id, "Registration completed");
        self.audit.registration_completed(user.id, name);

        self.store
            .find_user_by_id(user.id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }
}
