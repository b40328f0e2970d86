//! Audit trail side effects.
//!
//! Every denial and every successful gate actuation produces exactly one
//! log entry. Writes are fire-and-forget relative to the validation
//! decision: a failed append is logged and swallowed, never surfaced to the
//! caller.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::AccessLog;
use crate::services::{CredentialStore, DenialReason};

pub const ACTION_GATE_TRIGGERED: &str = "Gate Triggered";
pub const ACTION_GATE_TRIGGER_FAILED: &str = "Gate Trigger Failed";
pub const ACTION_ACCESS_DENIED: &str = "Access Denied";
pub const ACTION_ACCESS_REVOKED: &str = "Access Revoked";
pub const ACTION_USER_REACTIVATED: &str = "User Reactivated";
pub const ACTION_INVITE_CREATED: &str = "Invite Created";
pub const ACTION_REGISTRATION_COMPLETED: &str = "Registration Completed";

#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn CredentialStore>,
}

impl AuditTrail {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Append an entry in the background; best effort.
    pub fn record(&self, user_id: Uuid, action: &str, details: String) {
        let entry = AccessLog::new(user_id, action, details);
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.append_log(&entry).await {
                tracing::warn!(
                    user_id = %entry.user_id,
                    action = %entry.action,
                    error = %e,
                    "Failed to append audit log entry"
                );
            }
        });
    }

    pub fn access_denied(&self, user_id: Uuid, reason: &DenialReason, gate: Option<&str>) {
        let details = match gate {
            Some(gate) => format!(
                "Unauthorized access attempt to gate {}. Reason: {}",
                gate,
                reason.message()
            ),
            None => format!("Unauthorized access attempt. Reason: {}", reason.message()),
        };
        self.record(user_id, ACTION_ACCESS_DENIED, details);
    }

    pub fn gate_triggered(&self, user_id: Uuid, gate: &str, geolocation: Option<&str>) {
        let details = match geolocation {
            Some(location) => format!("Gate {} triggered. Location: {}", gate, location),
            None => format!("Gate {} triggered.", gate),
        };
        self.record(user_id, ACTION_GATE_TRIGGERED, details);
    }

    /// A validation passed but the physical actuation failed; this entry is
    /// distinct from a denial so the trail stays truthful.
    pub fn gate_trigger_failed(&self, user_id: Uuid, gate: &str, error: &str) {
        self.record(
            user_id,
            ACTION_GATE_TRIGGER_FAILED,
            format!("Gate {} trigger attempt failed: {}", gate, error),
        );
    }

    pub fn access_revoked(&self, actor_id: Uuid, target_name: &str, affected_invitees: u64) {
        self.record(
            actor_id,
            ACTION_ACCESS_REVOKED,
            format!(
                "Access of {} was revoked. Active invitees affected: {}",
                target_name, affected_invitees
            ),
        );
    }

    pub fn user_reactivated(&self, actor_id: Uuid, target_name: &str) {
        self.record(
            actor_id,
            ACTION_USER_REACTIVATED,
            format!("User {} was reactivated.", target_name),
        );
    }

    pub fn invite_created(&self, actor_id: Uuid, invitee_name: &str) {
        self.record(
            actor_id,
            ACTION_INVITE_CREATED,
            format!("Invite created for {}.", invitee_name),
        );
    }

    pub fn registration_completed(&self, user_id: Uuid, name: &str) {
        self.record(
            user_id,
            ACTION_REGISTRATION_COMPLETED,
            format!("User {} completed registration and is active.", name),
        );
    }
}
