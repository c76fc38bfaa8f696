//! Shared data shapes for the command dispatcher (§4.1). The dispatch logic
//! itself lives in the `wizard-dispatch` crate; these types are shared with
//! the gateway and CLI, which also need to read and render envelopes.

use serde::{Deserialize, Serialize};

/// Route order is a frozen contract: it must never reorder or grow.
pub const DISPATCH_CONTRACT_VERSION: &str = "m1.1";
pub const DISPATCH_ROUTE_ORDER: [&str; 3] = ["ucode", "shell", "vibe"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchContract {
    pub version: String,
    pub route_order: Vec<String>,
}

impl Default for DispatchContract {
    fn default() -> Self {
        Self {
            version: DISPATCH_CONTRACT_VERSION.to_string(),
            route_order: DISPATCH_ROUTE_ORDER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Success,
    Error,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchTarget {
    Ucode,
    Shell,
    Vibe,
    Confirm,
}

/// The shell-passthrough payload produced by Stage 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellPayload {
    pub command: String,
    pub args: Vec<String>,
    pub raw: String,
    pub validation_reason: String,
    pub requires_confirmation: bool,
    pub confirmation_reason: Option<String>,
}

/// One entry in the optional stage-by-stage debug trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTraceEntry {
    pub stage: u8,
    pub decision: String,
    #[serde(flatten)]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugInfo {
    pub enabled: bool,
    pub route_trace: Vec<RouteTraceEntry>,
}

/// The dispatch response envelope (§3). Always carries the frozen contract
/// metadata, on success paths and error paths alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEnvelope {
    pub status: DispatchStatus,
    pub stage: Option<u8>,
    pub dispatch_to: Option<DispatchTarget>,
    pub command: Option<String>,
    pub confidence: Option<f64>,
    pub skill: Option<String>,
    pub message: String,
    pub shell: Option<ShellPayload>,
    pub debug: DebugInfo,
    pub contract: DispatchContract,
}

impl DispatchEnvelope {
    pub fn base() -> Self {
        Self {
            status: DispatchStatus::Success,
            stage: None,
            dispatch_to: None,
            command: None,
            confidence: None,
            skill: None,
            message: String::new(),
            shell: None,
            debug: DebugInfo::default(),
            contract: DispatchContract::default(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut env = Self::base();
        env.status = DispatchStatus::Error;
        env.message = message.into();
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_is_frozen() {
        let c = DispatchContract::default();
        assert_eq!(c.version, "m1.1");
        assert_eq!(c.route_order, vec!["ucode", "shell", "vibe"]);
    }

    #[test]
    fn error_envelope_still_carries_contract() {
        let env = DispatchEnvelope::error("Command required");
        assert_eq!(env.status, DispatchStatus::Error);
        assert_eq!(env.contract.version, "m1.1");
    }
}
