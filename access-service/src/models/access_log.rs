//! Append-only audit record. Created by the core's logging side effects or
//! by administrative actions; never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessLog {
    pub id: Uuid,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: Uuid,
    /// Action category, e.g. "Gate Triggered", "Access Denied".
    #[schema(example = "Gate Triggered")]
    pub action: String,
    /// Human-diagnostic detail; may embed a geolocation string.
    pub details: String,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,
}

impl AccessLog {
    pub fn new(user_id: Uuid, action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action: action.into(),
            details: details.into(),
            timestamp: Utc::now(),
        }
    }
}
