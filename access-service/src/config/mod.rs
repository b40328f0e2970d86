use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::collections::HashMap;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub home_assistant: HomeAssistantConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// HS256 signing secret for session tokens.
    pub secret: String,
    /// Fixed validity of issued tokens.
    pub token_ttl_hours: i64,
    /// Cadence of client-side re-validation while a session is active.
    pub poll_interval_seconds: u64,
    /// Delay between a denial and the forced logout, so the reason can be
    /// displayed.
    pub logout_grace_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeAssistantConfig {
    pub base_url: String,
    pub token: String,
    pub request_timeout_seconds: u64,
    /// Gate id -> Home Assistant entity id.
    pub gate_entities: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerConfig {
    pub enabled: SwaggerMode,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SwaggerMode {
    Public,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl AccessConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AccessConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("access-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
            },
            session: SessionConfig {
                secret: get_env("SESSION_SECRET", None, is_prod)?,
                token_ttl_hours: get_env("SESSION_TOKEN_TTL_HOURS", Some("24"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
                poll_interval_seconds: get_env(
                    "SESSION_POLL_INTERVAL_SECONDS",
                    Some("30"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(30),
                logout_grace_seconds: get_env("SESSION_LOGOUT_GRACE_SECONDS", Some("3"), is_prod)?
                    .parse()
                    .unwrap_or(3),
            },
            home_assistant: HomeAssistantConfig {
                base_url: get_env(
                    "HOME_ASSISTANT_URL",
                    Some("http://homeassistant.local:8123"),
                    is_prod,
                )?,
                token: get_env("HOME_ASSISTANT_TOKEN", None, is_prod)?,
                request_timeout_seconds: get_env(
                    "HOME_ASSISTANT_TIMEOUT_SECONDS",
                    Some("5"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(5),
                gate_entities: parse_gate_entities(&get_env(
                    "GATE_ENTITIES",
                    Some("north=switch.north_gate,south=switch.south_gate"),
                    is_prod,
                )?)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            },
            swagger: SwaggerConfig {
                enabled: get_env("ENABLE_SWAGGER", Some("public"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: get_env("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                login_window_seconds: get_env(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                global_ip_limit: get_env("RATE_LIMIT_GLOBAL_IP_LIMIT", Some("100"), is_prod)?
                    .parse()
                    .unwrap_or(100),
                global_ip_window_seconds: get_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(60),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.session.token_ttl_hours <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_TOKEN_TTL_HOURS must be positive"
            )));
        }

        if self.session.poll_interval_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_POLL_INTERVAL_SECONDS must be positive"
            )));
        }

        if self.home_assistant.gate_entities.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATE_ENTITIES must configure at least one gate"
            )));
        }

        if self.environment == Environment::Prod {
            if self.session.secret.len() < 32 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "SESSION_SECRET must be at least 32 bytes in production"
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

/// Parse "north=switch.north_gate,south=switch.south_gate" into a map.
fn parse_gate_entities(raw: &str) -> Result<HashMap<String, String>, AppError> {
    let mut entities = HashMap::new();
    for pair in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let (gate, entity) = pair.split_once('=').ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "GATE_ENTITIES entries must look like gate=entity_id, got '{}'",
                pair
            ))
        })?;
        entities.insert(gate.trim().to_string(), entity.trim().to_string());
    }
    Ok(entities)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}
