//! Shared shapes for the policy enforcer (§4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// `{task_id, rule, reason, severity, timestamp}`. Appended to a bounded,
/// append-only audit log whenever a policy rule fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyViolation {
    pub task_id: String,
    pub rule: String,
    pub reason: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl PolicyViolation {
    pub fn new(task_id: impl Into<String>, rule: impl Into<String>, reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            task_id: task_id.into(),
            rule: rule.into(),
            reason: reason.into(),
            severity,
            timestamp: Utc::now(),
        }
    }
}
