//! Services layer for the access service.
//!
//! Holds the core of the system: the session token codec, the access
//! evaluator, the session validation service, the revocation/invite
//! operations, and the collaborator traits for the credential store and
//! the gate actuator.

mod actuator;
mod admin;
pub mod audit;
pub mod error;
mod evaluator;
mod monitor;
mod session;
mod store;
mod token;

pub use actuator::{GateActuator, HomeAssistantActuator, MockActuator};
pub use admin::{AdminService, InviteDetails};
pub use audit::AuditTrail;
pub use error::ServiceError;
pub use evaluator::{AccessEvaluator, DenialReason, Verdict};
pub use monitor::{SessionMonitor, DEFAULT_LOGOUT_GRACE, DEFAULT_POLL_INTERVAL};
pub use session::{SessionService, SessionValidation};
pub use store::{CredentialStore, MemoryStore, PgStore};
pub use token::{SessionClaims, SessionTokenService, TokenError};
