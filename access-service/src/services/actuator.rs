//! Gate actuator bridge: the home-automation collaborator behind a trait.
//!
//! Invoked only after a successful gate validation. Failures surface to the
//! caller so the audit trail can record an attempted-but-failed trigger,
//! distinct from a denial.

use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::HomeAssistantConfig;

#[async_trait]
pub trait GateActuator: Send + Sync {
    /// Pulse the physical actuator for a gate id.
    async fn trigger(&self, gate_id: &str) -> Result<(), AppError>;
}

/// Home Assistant REST adapter: each gate maps to a switch entity that is
/// turned on to pulse the gate relay.
pub struct HomeAssistantActuator {
    client: reqwest::Client,
    base_url: String,
    token: String,
    entities: HashMap<String, String>,
}

impl HomeAssistantActuator {
    pub fn new(config: &HomeAssistantConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            entities: config.gate_entities.clone(),
        })
    }
}

#[async_trait]
impl GateActuator for HomeAssistantActuator {
    async fn trigger(&self, gate_id: &str) -> Result<(), AppError> {
        let entity_id = self.entities.get(gate_id).ok_or_else(|| {
            AppError::BadGateway(format!("No actuator entity configured for gate {}", gate_id))
        })?;

        let url = format!("{}/api/services/switch/turn_on", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "entity_id": entity_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::BadGateway(format!(
                "Home Assistant returned {} for gate {}",
                response.status(),
                gate_id
            )));
        }

        tracing::info!(gate_id = gate_id, entity_id = %entity_id, "Gate actuator triggered");
        Ok(())
    }
}

/// Test actuator: records triggers and can be told to fail.
#[derive(Default)]
pub struct MockActuator {
    triggered: std::sync::Mutex<Vec<String>>,
    failing: std::sync::atomic::AtomicBool,
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggered(&self) -> Vec<String> {
        self.triggered.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl GateActuator for MockActuator {
    async fn trigger(&self, gate_id: &str) -> Result<(), AppError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::BadGateway("actuator unreachable".to_string()));
        }
        self.triggered.lock().unwrap().push(gate_id.to_string());
        Ok(())
    }
}
