//! Session monitor: polling re-validation for an active session.
//!
//! While a session is displayed as active, the holder re-validates it on an
//! interval so revocations and window expiries that happen after login are
//! caught without the user taking an action. On a denial the monitor waits
//! a short grace period (so the reason can be shown), invokes the
//! forced-logout hook, and stops. Store failures are retried on the next
//! tick, never treated as a denial.
//!
//! All state is explicit: the token under watch, the cadence, and the
//! cancellation token are handed in; cancelling releases the timer.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::services::{DenialReason, SessionService};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_LOGOUT_GRACE: Duration = Duration::from_secs(3);

pub struct SessionMonitor {
    sessions: SessionService,
    poll_interval: Duration,
    logout_grace: Duration,
    cancel: CancellationToken,
}

impl SessionMonitor {
    pub fn new(sessions: SessionService, poll_interval: Duration, logout_grace: Duration) -> Self {
        Self {
            sessions,
            poll_interval,
            logout_grace,
            cancel: CancellationToken::new(),
        }
    }

    /// Build a monitor with the configured cadence.
    pub fn from_config(sessions: SessionService, config: &crate::config::SessionConfig) -> Self {
        Self::new(
            sessions,
            Duration::from_secs(config.poll_interval_seconds),
            Duration::from_secs(config.logout_grace_seconds),
        )
    }

    /// Token the owner can use to stop the monitor when its context goes
    /// away.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Watch a session until it is denied or the monitor is cancelled.
    ///
    /// Returns the denial reason after invoking `on_forced_logout`, or
    /// `None` when cancelled first. The first validation runs immediately;
    /// subsequent ones follow the poll interval.
    pub async fn watch<F>(self, token: String, on_forced_logout: F) -> Option<DenialReason>
    where
        F: FnOnce(&DenialReason) + Send,
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = ticker.tick() => {}
            }

            match self.sessions.validate_session(&token).await {
                Ok(validation) if validation.valid => continue,
                Ok(validation) => {
                    let reason = validation
                        .reason
                        .unwrap_or(DenialReason::SessionInvalid);
                    tracing::info!(
                        reason = reason.code(),
                        "Session no longer valid; forcing logout after grace period"
                    );

                    // Grace period so the denial reason can be displayed
                    // before the session is torn down; still cancellable.
                    tokio::select! {
                        _ = self.cancel.cancelled() => return None,
                        _ = tokio::time::sleep(self.logout_grace) => {}
                    }

                    on_forced_logout(&reason);
                    return Some(reason);
                }
                Err(e) => {
                    // System failure: retry on the next tick rather than
                    // interpreting it as a denial.
                    tracing::warn!(error = %e, "Session re-validation failed; will retry");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::models::{Role, User, UserStatus};
    use crate::services::{
        AccessEvaluator, AuditTrail, CredentialStore, MemoryStore, SessionTokenService,
    };
    use crate::utils::{hash_password, Password};
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn build_sessions(store: Arc<MemoryStore>) -> SessionService {
        let tokens = SessionTokenService::new(&SessionConfig {
            secret: "test-secret-key-that-is-long-enough".to_string(),
            token_ttl_hours: 24,
            poll_interval_seconds: 30,
            logout_grace_seconds: 3,
        });
        let evaluator = AccessEvaluator::new(store.clone());
        let audit = AuditTrail::new(store.clone());
        SessionService::new(store, tokens, evaluator, audit)
    }

    fn seeded_user(store: &MemoryStore) -> User {
        let mut user = User::new(
            "Watched".to_string(),
            "watched@example.com".to_string(),
            Role::Guest,
            vec!["north".to_string()],
        );
        user.status = UserStatus::Active;
        user.password_hash = Some(
            hash_password(&Password::new("correct horse".to_string()))
                .unwrap()
                .into_string(),
        );
        store.seed_user(user.clone());
        user
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_forces_logout_after_revocation() {
        let store = Arc::new(MemoryStore::new());
        let user = seeded_user(&store);
        let sessions = build_sessions(store.clone());
        let token = sessions.login(&user.email, "correct horse").await.unwrap();

        let monitor = SessionMonitor::new(
            sessions,
            DEFAULT_POLL_INTERVAL,
            DEFAULT_LOGOUT_GRACE,
        );

        let logged_out = Arc::new(AtomicBool::new(false));
        let flag = logged_out.clone();
        let handle = tokio::spawn(async move {
            monitor
                .watch(token, move |_| flag.store(true, Ordering::SeqCst))
                .await
        });

        // First tick validates successfully, then the user is revoked.
        tokio::time::sleep(Duration::from_secs(1)).await;
        store.revoke_user(user.id, Utc::now()).await.unwrap();

        let reason = handle.await.unwrap();
        assert_eq!(reason.unwrap(), DenialReason::AccessExpired);
        assert!(logged_out.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_cancellation_stops_polling() {
        let store = Arc::new(MemoryStore::new());
        let user = seeded_user(&store);
        let sessions = build_sessions(store.clone());
        let token = sessions.login(&user.email, "correct horse").await.unwrap();

        let monitor = SessionMonitor::new(
            sessions,
            DEFAULT_POLL_INTERVAL,
            DEFAULT_LOGOUT_GRACE,
        );
        let cancel = monitor.cancel_token();

        let handle = tokio::spawn(async move { monitor.watch(token, |_| {}).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_retries_through_store_failures() {
        let store = Arc::new(MemoryStore::new());
        let user = seeded_user(&store);
        let sessions = build_sessions(store.clone());
        let token = sessions.login(&user.email, "correct horse").await.unwrap();

        let monitor = SessionMonitor::new(
            sessions,
            DEFAULT_POLL_INTERVAL,
            DEFAULT_LOGOUT_GRACE,
        );

        // Store goes down, then comes back with the user revoked. The
        // outage must not read as a denial; the revocation after it must.
        store.set_failing(true);
        let handle = {
            let store = store.clone();
            let user_id = user.id;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(65)).await;
                store.set_failing(false);
                store.revoke_user(user_id, Utc::now()).await.unwrap();
            })
        };

        let reason = monitor.watch(token, |_| {}).await;
        handle.await.unwrap();
        assert_eq!(reason.unwrap(), DenialReason::AccessExpired);
    }
}
