//! The Completion Gateway's 11-step pipeline (§4.2) — normalize, guard the
//! budget, classify, route, check the router contract, guard oversized
//! cloud prompts, enforce policy, check quota, execute, account, and
//! optionally sanity-cross-check against the cloud.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use wizard_core::classification::{Privacy, Route, TaskClassification};
use wizard_core::error::{ErrorEnvelope, GatewayError};
use wizard_core::provider::{Backend, CompletionRequest as BackendRequest};
use wizard_policy::{PolicyEnforcer, RouteRequest};
use wizard_providers::BackendRouter;
use wizard_telemetry::CostTracker;

use crate::classifier::{self, ClassifyInput};
use crate::failures::{ESCALATION_THRESHOLD, FailureTracker};
use crate::quota::QuotaTracker;

const OVERSIZE_TOKEN_CEILING: u32 = 6_000;
const SANITY_CHECK_TIMEOUT_MS: u64 = 4_000;

/// A completion request as received over `POST /api/ai/complete` (§6).
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionGatewayRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default = "default_workspace")]
    pub workspace: String,
    #[serde(default)]
    pub privacy: Option<Privacy>,
    #[serde(default)]
    pub urgency: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub force_cloud: bool,
    #[serde(default)]
    pub cloud_sanity: bool,
    #[serde(default = "default_true")]
    pub allow_cloud: bool,
    #[serde(default)]
    pub offline_required: bool,
    #[serde(default)]
    pub ghost_mode: bool,
    #[serde(default)]
    pub task_hint: Option<String>,
}

fn default_max_tokens() -> u32 {
    1024
}
fn default_workspace() -> String {
    "core".to_string()
}
fn default_true() -> bool {
    true
}

/// The response contract (§4.2).
#[derive(Debug, Clone, Serialize)]
pub struct CompletionGatewayResponse {
    pub success: bool,
    pub content: String,
    pub model: String,
    pub provider: String,
    pub backend: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub cost: f64,
    pub route: Option<Route>,
    pub classification: Option<TaskClassification>,
    pub cached: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    pub timestamp: chrono::DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanity_check: Option<String>,
}

impl CompletionGatewayResponse {
    fn failure(error: GatewayError, latency_ms: u64) -> Self {
        Self {
            success: false,
            content: String::new(),
            model: String::new(),
            provider: String::new(),
            backend: "local".to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            cost: 0.0,
            route: None,
            classification: None,
            cached: false,
            latency_ms,
            error: Some(error.to_envelope()),
            timestamp: Utc::now(),
            sanity_check: None,
        }
    }
}

fn mode_preset(mode: &str) -> (&'static str, f32) {
    match mode {
        "code" => ("devstral-small-2", 0.2),
        "creative" => ("mistral-large", 1.0),
        _ => ("mistral-small", 0.7),
    }
}

/// Everything the pipeline reads or mutates, borrowed from `GatewayState`.
pub struct PipelineContext<'a> {
    pub backend_router: &'a BackendRouter,
    pub cost_tracker: &'a CostTracker,
    pub policy: &'a PolicyEnforcer,
    pub quota: &'a QuotaTracker,
    pub failures: &'a FailureTracker,
}

pub async fn run(ctx: &PipelineContext<'_>, request: CompletionGatewayRequest) -> CompletionGatewayResponse {
    let started = Instant::now();

    // 1. Normalize.
    let task_id = request.task_id.clone().unwrap_or_else(|| format!("task-{}", uuid::Uuid::new_v4()));
    let mode = request.mode.clone().unwrap_or_else(|| "conversation".to_string());
    let (mode_default_model, mode_temperature) = mode_preset(&mode);
    let temperature = request.temperature.unwrap_or(mode_temperature);
    let mut model = request.model.clone().unwrap_or_else(|| mode_default_model.to_string());

    // 2. Budget & rate guardrails.
    ctx.cost_tracker.check_resets();
    if ctx.cost_tracker.budget_exceeded() {
        return CompletionGatewayResponse::failure(GatewayError::BudgetExceeded, elapsed_ms(started));
    }
    if ctx.cost_tracker.request_cap_exceeded() {
        return CompletionGatewayResponse::failure(GatewayError::RequestCapExceeded, elapsed_ms(started));
    }

    // 3. Classify.
    let classification = classifier::classify(&ClassifyInput {
        task_id: task_id.clone(),
        workspace: request.workspace.clone(),
        prompt: &request.prompt,
        explicit_privacy: request.privacy,
        urgency_hint: request.urgency,
    });

    // 4. Route.
    let force_local =
        request.offline_required || classification.privacy == Privacy::Private || request.ghost_mode || !request.allow_cloud;
    let mut cloud_sanity = request.cloud_sanity;
    if force_local {
        cloud_sanity = false;
    }
    let mut wants_cloud = !force_local && request.force_cloud;
    let mut escalation_reason = if wants_cloud { Some("force_cloud") } else { None };

    // Escalate to cloud without an explicit force_cloud: two prior local
    // failures for this task id, or the classifier tagging the task `burst`.
    if !force_local && !wants_cloud {
        if ctx.failures.should_escalate(&task_id) {
            wants_cloud = true;
            escalation_reason = Some("local_failure");
        } else if classification.tags.iter().any(|tag| tag == "burst") {
            wants_cloud = true;
            escalation_reason = Some("burst_request");
        }
    }

    // 5. Contract check.
    let contract_request = wizard_contract::ContractRequest {
        intent: classification.intent,
        mode: &mode,
        privacy: &classification.privacy.to_string(),
        ghost_mode: request.ghost_mode,
        offline_required: request.offline_required,
    };
    let contract = match wizard_contract::enforce(&contract_request, request.force_cloud) {
        Ok(c) => c,
        Err(e) => {
            warn!(%task_id, error = %e, "router contract refused force_cloud");
            return CompletionGatewayResponse::failure(GatewayError::BackendUnavailable(e.to_string()), elapsed_ms(started));
        }
    };
    if request.model.is_none() {
        model = contract.model.clone();
    }
    if !contract.online_allowed {
        wants_cloud = false;
        escalation_reason = None;
    }

    // 6. Oversize guard.
    if wants_cloud && classification.estimated_tokens > OVERSIZE_TOKEN_CEILING {
        return CompletionGatewayResponse::failure(
            GatewayError::Oversize {
                tokens: classification.estimated_tokens,
                ceiling: OVERSIZE_TOKEN_CEILING,
            },
            elapsed_ms(started),
        );
    }

    let backend_name = if wants_cloud {
        ctx.backend_router.any_cloud().map(|b| b.name().to_string())
    } else {
        ctx.backend_router.any_local().map(|b| b.name().to_string())
    };

    let estimated_cost = if wants_cloud {
        ctx.cost_tracker.pricing().compute_cost(&model, classification.estimated_tokens, request.max_tokens)
    } else {
        0.0
    };

    // 7. Policy enforcement.
    let backend_name_for_policy = backend_name.clone().unwrap_or_else(|| "local".to_string());
    let (mut policy_valid, mut policy_reason) = ctx.policy.validate_route(&RouteRequest {
        task_id: &task_id,
        privacy: &classification.privacy.to_string(),
        backend_name: &backend_name_for_policy,
        backend_is_local: !wants_cloud,
        estimated_cost,
        prompt: &request.prompt,
    });

    if wants_cloud && !policy_valid {
        info!(%task_id, reason = ?policy_reason, "cloud route blocked by policy, falling back to local");
        wants_cloud = false;
        let (valid, reason) = ctx.policy.validate_route(&RouteRequest {
            task_id: &task_id,
            privacy: &classification.privacy.to_string(),
            backend_name: "local",
            backend_is_local: true,
            estimated_cost: 0.0,
            prompt: &request.prompt,
        });
        policy_valid = valid;
        policy_reason = reason;
    }

    if !policy_valid {
        let reason = policy_reason.unwrap_or_else(|| "policy violation".to_string());
        return CompletionGatewayResponse::failure(GatewayError::BackendUnavailable(reason), elapsed_ms(started));
    }

    // 8. Quota check.
    if wants_cloud {
        if let Some(provider) = &backend_name {
            if ctx.quota.exceeded(provider) {
                info!(%task_id, %provider, "cloud quota exceeded, refusing locally");
                wants_cloud = false;
            }
        }
    }

    let route = if wants_cloud {
        Route::cloud(
            &task_id,
            &model,
            classification.estimated_tokens,
            estimated_cost,
            escalation_reason.unwrap_or("classification_escalated_to_cloud"),
            classification.privacy,
        )
    } else {
        Route::local(&task_id, &model, classification.estimated_tokens, classification.privacy)
    };

    // 9. Execute.
    let backend = if wants_cloud { ctx.backend_router.any_cloud() } else { ctx.backend_router.any_local() };
    let Some(backend) = backend else {
        return CompletionGatewayResponse::failure(
            GatewayError::BackendUnavailable(if wants_cloud { "cloud".to_string() } else { "local".to_string() }),
            elapsed_ms(started),
        );
    };

    let backend_request = BackendRequest {
        prompt: request.prompt.clone(),
        system_prompt: request.system_prompt.clone(),
        model: model.clone(),
        temperature,
        max_tokens: request.max_tokens,
        stream: request.stream,
    };

    let completion = match backend.complete(backend_request).await {
        Ok(response) => {
            if !wants_cloud {
                ctx.failures.clear(&task_id);
            }
            response
        }
        Err(e) => {
            if !wants_cloud {
                let failure_count = ctx.failures.record_failure(&task_id);
                warn!(%task_id, error = %e, failure_count, escalates_at = ESCALATION_THRESHOLD, "local backend execution failed");
            }
            return CompletionGatewayResponse::failure(GatewayError::BackendFailed(e.to_string()), elapsed_ms(started));
        }
    };

    // 10. Post-execution.
    let cost = if wants_cloud {
        let actual = ctx.cost_tracker.record_usage(&model, completion.usage.prompt_tokens, completion.usage.completion_tokens);
        ctx.policy.record_cloud_cost(actual);
        if let Some(provider) = &backend_name {
            ctx.quota.record(provider);
        }
        actual
    } else {
        ctx.cost_tracker.record_usage(&model, completion.usage.prompt_tokens, completion.usage.completion_tokens);
        0.0
    };

    // 11. Sanity cross-check (optional).
    let sanity_check = if !wants_cloud && cloud_sanity && contract.online_allowed && should_sanity_check(&completion.content) {
        match ctx.backend_router.any_cloud() {
            Some(cloud_backend) => {
                let sanity_request = BackendRequest {
                    prompt: request.prompt.clone(),
                    system_prompt: request.system_prompt.clone(),
                    model: contract.model.clone(),
                    temperature,
                    max_tokens: request.max_tokens,
                    stream: false,
                };
                match tokio::time::timeout(
                    std::time::Duration::from_millis(SANITY_CHECK_TIMEOUT_MS),
                    cloud_backend.complete(sanity_request),
                )
                .await
                {
                    Ok(Ok(sanity_response)) => Some(sanity_response.content),
                    Ok(Err(e)) => {
                        warn!(%task_id, error = %e, "sanity cross-check backend call failed");
                        None
                    }
                    Err(_) => {
                        warn!(%task_id, "sanity cross-check timed out");
                        None
                    }
                }
            }
            None => None,
        }
    } else {
        None
    };

    CompletionGatewayResponse {
        success: true,
        content: completion.content,
        model: completion.model,
        provider: backend.name().to_string(),
        backend: if wants_cloud { "cloud".to_string() } else { "local".to_string() },
        prompt_tokens: completion.usage.prompt_tokens,
        completion_tokens: completion.usage.completion_tokens,
        total_tokens: completion.usage.total(),
        cost,
        route: Some(route),
        classification: Some(classification),
        cached: false,
        latency_ms: elapsed_ms(started),
        error: None,
        timestamp: Utc::now(),
        sanity_check,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Heuristic trigger for an optional cloud sanity cross-check: a
/// suspiciously short response, or one hedging with a low-confidence phrase.
fn should_sanity_check(content: &str) -> bool {
    const LOW_CONFIDENCE_PHRASES: &[&str] = &["i'm not sure", "i am not sure", "maybe", "as an ai"];
    if content.trim().len() < 20 {
        return true;
    }
    let lower = content.to_lowercase();
    LOW_CONFIDENCE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use wizard_core::provider::{BackendError, CompletionResponse, Usage};

    /// A backend stub that either always succeeds or always fails, so
    /// pipeline tests can exercise routing/escalation without a network call.
    struct StubBackend {
        name: &'static str,
        is_local: bool,
        fails: bool,
    }

    #[async_trait]
    impl Backend for StubBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn is_local(&self) -> bool {
            self.is_local
        }

        async fn complete(&self, _request: BackendRequest) -> Result<CompletionResponse, BackendError> {
            if self.fails {
                Err(BackendError::RequestFailed("stub failure".to_string()))
            } else {
                Ok(CompletionResponse {
                    content: "stub response".to_string(),
                    model: "stub-model".to_string(),
                    usage: Usage { prompt_tokens: 10, completion_tokens: 10 },
                })
            }
        }
    }

    fn test_router(local_fails: bool) -> BackendRouter {
        let mut router = BackendRouter::new("local");
        router.register(
            "local",
            std::sync::Arc::new(StubBackend { name: "local", is_local: true, fails: local_fails }),
        );
        router.register(
            "cloud",
            std::sync::Arc::new(StubBackend { name: "cloud", is_local: false, fails: false }),
        );
        router
    }

    fn test_request(overrides: impl FnOnce(&mut CompletionGatewayRequest)) -> CompletionGatewayRequest {
        let mut request = CompletionGatewayRequest {
            prompt: "refactor this function".to_string(),
            model: None,
            system_prompt: None,
            max_tokens: 256,
            temperature: None,
            stream: false,
            mode: None,
            task_id: Some("t-fixed".to_string()),
            workspace: "core".to_string(),
            privacy: None,
            urgency: false,
            tags: Vec::new(),
            conversation_id: None,
            force_cloud: false,
            cloud_sanity: false,
            allow_cloud: true,
            offline_required: false,
            ghost_mode: false,
            task_hint: None,
        };
        overrides(&mut request);
        request
    }

    #[test]
    fn mode_presets_match_the_table() {
        assert_eq!(mode_preset("code").1, 0.2);
        assert_eq!(mode_preset("conversation").1, 0.7);
        assert_eq!(mode_preset("creative").1, 1.0);
    }

    #[test]
    fn short_response_triggers_sanity_check() {
        assert!(should_sanity_check("ok"));
    }

    #[test]
    fn hedging_phrase_triggers_sanity_check() {
        assert!(should_sanity_check("I'm not sure, but maybe this is the right approach and here is a longer explanation."));
    }

    #[test]
    fn confident_long_response_skips_sanity_check() {
        assert!(!should_sanity_check(
            "Here is a complete, confident answer with plenty of detail and no hedging language at all."
        ));
    }

    #[tokio::test]
    async fn private_force_cloud_is_refused_before_any_backend_call() {
        let backend_router = test_router(false);
        let cost_tracker = CostTracker::new(f64::MAX, f64::MAX, u64::MAX);
        let policy = PolicyEnforcer::new(true, f64::MAX, f64::MAX, 100);
        let quota = QuotaTracker::default();
        let failures = FailureTracker::new();
        let ctx = PipelineContext { backend_router: &backend_router, cost_tracker: &cost_tracker, policy: &policy, quota: &quota, failures: &failures };

        let request = test_request(|r| {
            r.privacy = Some(Privacy::Private);
            r.force_cloud = true;
        });

        let response = run(&ctx, request).await;

        assert!(!response.success);
        assert!(matches!(response.error.as_ref().map(|e| e.code), Some(wizard_core::error::ErrorCode::BackendUnavailable)));
        // The cloud stub never runs, so no usage was ever recorded against it.
        assert_eq!(response.total_tokens, 0);
    }

    #[tokio::test]
    async fn force_cloud_with_online_allowed_succeeds() {
        let backend_router = test_router(false);
        let cost_tracker = CostTracker::new(f64::MAX, f64::MAX, u64::MAX);
        let policy = PolicyEnforcer::new(true, f64::MAX, f64::MAX, 100);
        let quota = QuotaTracker::default();
        let failures = FailureTracker::new();
        let ctx = PipelineContext { backend_router: &backend_router, cost_tracker: &cost_tracker, policy: &policy, quota: &quota, failures: &failures };

        let request = test_request(|r| r.force_cloud = true);
        let response = run(&ctx, request).await;

        assert!(response.success);
        assert_eq!(response.backend, "cloud");
        assert_eq!(response.route.as_ref().and_then(|r| r.escalation_reason.clone()), Some("force_cloud".to_string()));
    }

    #[tokio::test]
    async fn two_local_failures_escalate_a_later_request_to_cloud() {
        let failing_router = test_router(true);
        let cost_tracker = CostTracker::new(f64::MAX, f64::MAX, u64::MAX);
        let policy = PolicyEnforcer::new(true, f64::MAX, f64::MAX, 100);
        let quota = QuotaTracker::default();
        let failures = FailureTracker::new();

        for _ in 0..2 {
            let ctx =
                PipelineContext { backend_router: &failing_router, cost_tracker: &cost_tracker, policy: &policy, quota: &quota, failures: &failures };
            let response = run(&ctx, test_request(|_| {})).await;
            assert!(!response.success);
        }
        assert!(failures.should_escalate("t-fixed"));

        let healthy_router = test_router(false);
        let ctx =
            PipelineContext { backend_router: &healthy_router, cost_tracker: &cost_tracker, policy: &policy, quota: &quota, failures: &failures };
        let response = run(&ctx, test_request(|_| {})).await;

        assert!(response.success);
        assert_eq!(response.backend, "cloud");
        assert_eq!(response.route.as_ref().and_then(|r| r.escalation_reason.clone()), Some("local_failure".to_string()));
    }

    #[tokio::test]
    async fn burst_tagged_prompt_escalates_to_cloud_without_force_cloud() {
        let backend_router = test_router(false);
        let cost_tracker = CostTracker::new(f64::MAX, f64::MAX, u64::MAX);
        let policy = PolicyEnforcer::new(true, f64::MAX, f64::MAX, 100);
        let quota = QuotaTracker::default();
        let failures = FailureTracker::new();
        let ctx = PipelineContext { backend_router: &backend_router, cost_tracker: &cost_tracker, policy: &policy, quota: &quota, failures: &failures };

        let request = test_request(|r| r.prompt = "we're seeing a burst of similar requests right now".to_string());
        let response = run(&ctx, request).await;

        assert!(response.success);
        assert_eq!(response.backend, "cloud");
        assert_eq!(response.route.as_ref().and_then(|r| r.escalation_reason.clone()), Some("burst_request".to_string()));
    }
}
