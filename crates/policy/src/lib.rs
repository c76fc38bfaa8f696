//! Policy enforcement for the Wizard edge gateway (§4.4).
//!
//! Provides:
//! - **Enforcer**: the four ordered routing rules plus the bounded
//!   violation log and cost-budget accounting
//! - **Detect**: secret-pattern detection and redaction
//! - **Endpoint**: SSRF-aware endpoint allowlisting for sync providers
//! - **Secrets**: encryption at rest for provider credentials

pub mod detect;
pub mod endpoint;
pub mod enforcer;
pub mod secrets;
pub mod violations;

pub use endpoint::{EndpointCheck, check_endpoint};
pub use enforcer::{PolicyEnforcer, PolicyStatus, RouteRequest};
pub use secrets::{EncryptedValue, SecretError, SecretsManager};
pub use violations::ViolationLog;
