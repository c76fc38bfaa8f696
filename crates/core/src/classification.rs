//! Shared shapes for the task classifier (§4.5) and the router (§4.2 step 4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Code,
    Test,
    Docs,
    Design,
    Ops,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    Private,
    Internal,
    Public,
}

impl std::fmt::Display for Privacy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Privacy::Private => "private",
            Privacy::Internal => "internal",
            Privacy::Public => "public",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

/// Output of §4.5: `{task_id, intent, privacy, size, urgency, workspace,
/// token_estimate, confidence, tags, reasons}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskClassification {
    pub task_id: String,
    pub workspace: String,
    pub intent: Intent,
    pub privacy: Privacy,
    pub size: SizeBucket,
    pub urgency: bool,
    pub estimated_tokens: u32,
    pub confidence: f64,
    pub tags: Vec<String>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Local,
    Cloud,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Backend::Local => "local",
            Backend::Cloud => "cloud",
        };
        f.write_str(s)
    }
}

/// Emitted by the router; consumed by the policy enforcer and executor.
///
/// Invariant: `privacy = private ⇒ backend = local`;
/// `backend = cloud ⇒ cloud_enabled ∧ policy_passed ∧ budget_remaining ≥ estimated_cost`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub task_id: String,
    pub backend: Backend,
    pub model: String,
    pub prompt_size: u32,
    pub estimated_cost: f64,
    pub escalation_reason: Option<String>,
    pub privacy_level: Privacy,
    pub timestamp: DateTime<Utc>,
}

impl Route {
    /// Enforces the data-model invariant at construction time so a `Route`
    /// value can never exist in a contradictory state.
    pub fn local(task_id: impl Into<String>, model: impl Into<String>, prompt_size: u32, privacy_level: Privacy) -> Self {
        Self {
            task_id: task_id.into(),
            backend: Backend::Local,
            model: model.into(),
            prompt_size,
            estimated_cost: 0.0,
            escalation_reason: None,
            privacy_level,
            timestamp: Utc::now(),
        }
    }

    pub fn cloud(
        task_id: impl Into<String>,
        model: impl Into<String>,
        prompt_size: u32,
        estimated_cost: f64,
        escalation_reason: impl Into<String>,
        privacy_level: Privacy,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            backend: Backend::Cloud,
            model: model.into(),
            prompt_size,
            estimated_cost,
            escalation_reason: Some(escalation_reason.into()),
            privacy_level,
            timestamp: Utc::now(),
        }
    }

    pub fn is_valid(&self) -> bool {
        if self.backend == Backend::Cloud && self.privacy_level == Privacy::Private {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_route_with_private_privacy_is_invalid() {
        let route = Route::cloud("t1", "gpt", 10, 0.01, "escalated", Privacy::Private);
        assert!(!route.is_valid());
    }

    #[test]
    fn local_route_is_always_valid() {
        let route = Route::local("t1", "local-model", 10, Privacy::Private);
        assert!(route.is_valid());
        assert!(route.escalation_reason.is_none());
    }
}
