//! Credential store: the persistence collaborator behind the access engine.
//!
//! The core only depends on the [`CredentialStore`] trait; `PgStore` is the
//! PostgreSQL production adapter and `MemoryStore` backs the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::models::{AccessLog, Role, User, UserStatus};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Look up a user by login identifier: email or national id.
    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError>;

    /// Look up a user by their unique invite/login code.
    async fn find_user_by_access_code(&self, code: &str) -> Result<Option<User>, AppError>;

    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    /// Idempotent status write; safe to apply redundantly under concurrent
    /// evaluation of the same user.
    async fn update_user_status(&self, id: Uuid, status: UserStatus) -> Result<(), AppError>;

    /// Revocation write: status to Expired and the window closed at `end`.
    async fn revoke_user(&self, id: Uuid, end: DateTime<Utc>) -> Result<(), AppError>;

    /// Bind a not-yet-onboarded user to their credential.
    async fn complete_registration(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        national_id: Option<&str>,
        password_hash: &str,
    ) -> Result<(), AppError>;

    async fn decrement_invites(&self, id: Uuid) -> Result<(), AppError>;

    /// All users whose `invited_by_id` equals `id`.
    async fn list_invitees_of(&self, id: Uuid) -> Result<Vec<User>, AppError>;

    /// Append-only audit write.
    async fn append_log(&self, entry: &AccessLog) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

// ==================== PostgreSQL adapter ====================

/// Row shape for the `users` table; codes are stored as text and parsed
/// into the closed enums at the boundary.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    national_id: Option<String>,
    role_code: String,
    status_code: String,
    access_start: Option<DateTime<Utc>>,
    access_end: Option<DateTime<Utc>>,
    access_code: String,
    password_hash: Option<String>,
    accessible_gates: Vec<String>,
    invited_by_id: Option<Uuid>,
    invites_remaining: i32,
    created_utc: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, AppError> {
        let role: Role = row
            .role_code
            .parse()
            .map_err(|e: String| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        let status: UserStatus = row
            .status_code
            .parse()
            .map_err(|e: String| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            national_id: row.national_id,
            role,
            status,
            access_start: row.access_start,
            access_end: row.access_end,
            access_code: row.access_code,
            password_hash: row.password_hash,
            accessible_gates: row.accessible_gates,
            invited_by_id: row.invited_by_id,
            invites_remaining: row.invites_remaining,
            created_utc: row.created_utc,
        })
    }
}

/// PostgreSQL credential store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) OR national_id = $1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?
        .map(User::try_from)
        .transpose()
    }

    async fn find_user_by_access_code(&self, code: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE access_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?
            .map(User::try_from)
            .transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, national_id, role_code, status_code,
                               access_start, access_end, access_code, password_hash,
                               accessible_gates, invited_by_id, invites_remaining, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.national_id)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.access_start)
        .bind(user.access_end)
        .bind(&user.access_code)
        .bind(&user.password_hash)
        .bind(&user.accessible_gates)
        .bind(user.invited_by_id)
        .bind(user.invites_remaining)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn update_user_status(&self, id: Uuid, status: UserStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET status_code = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn revoke_user(&self, id: Uuid, end: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET status_code = $1, access_end = $2 WHERE id = $3")
            .bind(UserStatus::Expired.as_str())
            .bind(end)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn complete_registration(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        national_id: Option<&str>,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = $1, email = $2, national_id = $3, password_hash = $4, status_code = $5
            WHERE id = $6
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(national_id)
        .bind(password_hash)
        .bind(UserStatus::Active.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn decrement_invites(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET invites_remaining = invites_remaining - 1 \
             WHERE id = $1 AND invites_remaining > 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn list_invitees_of(&self, id: Uuid) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE invited_by_id = $1")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn append_log(&self, entry: &AccessLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO access_logs (id, user_id, action, details, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.details)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }
}

// ==================== In-memory adapter ====================

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory credential store for tests. Can be flipped into a failing
/// state to exercise the system-failure outcome.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    logs: Mutex<Vec<AccessLog>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    pub fn logs(&self) -> Vec<AccessLog> {
        self.logs.lock().unwrap().clone()
    }

    /// Make every subsequent operation fail, simulating an unreachable store.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "store unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.check_available()?;
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        self.check_available()?;
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| {
                u.email.eq_ignore_ascii_case(identifier)
                    || u.national_id.as_deref() == Some(identifier)
            })
            .cloned())
    }

    async fn find_user_by_access_code(&self, code: &str) -> Result<Option<User>, AppError> {
        self.check_available()?;
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.access_code == code).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.check_available()?;
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user_status(&self, id: Uuid, status: UserStatus) -> Result<(), AppError> {
        self.check_available()?;
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.status = status;
        }
        Ok(())
    }

    async fn revoke_user(&self, id: Uuid, end: DateTime<Utc>) -> Result<(), AppError> {
        self.check_available()?;
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.status = UserStatus::Expired;
            user.access_end = Some(end);
        }
        Ok(())
    }

    async fn complete_registration(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        national_id: Option<&str>,
        password_hash: &str,
    ) -> Result<(), AppError> {
        self.check_available()?;
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.name = name.to_string();
            user.email = email.to_string();
            user.national_id = national_id.map(|s| s.to_string());
            user.password_hash = Some(password_hash.to_string());
            user.status = UserStatus::Active;
        }
        Ok(())
    }

    async fn decrement_invites(&self, id: Uuid) -> Result<(), AppError> {
        self.check_available()?;
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            if user.invites_remaining > 0 {
                user.invites_remaining -= 1;
            }
        }
        Ok(())
    }

    async fn list_invitees_of(&self, id: Uuid) -> Result<Vec<User>, AppError> {
        self.check_available()?;
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|u| u.invited_by_id == Some(id))
            .cloned()
            .collect())
    }

    async fn append_log(&self, entry: &AccessLog) -> Result<(), AppError> {
        self.check_available()?;
        self.logs.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check_available()
    }
}
