//! Axum HTTP surface (§6): `/health`, `/api/status`, `/api/rate-limits`,
//! `POST /api/ai/complete`, `POST /api/sync/<kind>`, plus `/pair` — the
//! device-pairing bootstrap a bearer token has to come from before any of
//! the above routes will authenticate.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use wizard_core::error::ErrorCode;
use wizard_core::ratelimit::RateLimitDecision;

use crate::orchestrator::SyncOrchestrator;
use crate::pipeline::{self, CompletionGatewayRequest, PipelineContext};
use crate::state::{GatewayState, SharedGatewayState};

pub fn build_router(state: SharedGatewayState, orchestrator: Arc<SyncOrchestrator>) -> Router {
    let max_concurrent_completions = state.config.gateway.max_concurrent_completions;
    let app_state = AppState { gateway: state, orchestrator };

    let completions = Router::new()
        .route("/api/ai/complete", post(complete_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent_completions));

    Router::new()
        .route("/health", get(health_handler))
        .route("/pair", post(pair_handler))
        .route("/api/status", get(status_handler))
        .route("/api/rate-limits", get(rate_limits_handler))
        .route("/api/sync/{kind}", post(sync_handler))
        .merge(completions)
        .layer(middleware::from_fn_with_state(app_state.clone(), rate_limit_middleware))
        .layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[derive(Clone)]
struct AppState {
    gateway: SharedGatewayState,
    orchestrator: Arc<SyncOrchestrator>,
}

fn device_key(headers: &HeaderMap, addr: Option<SocketAddr>) -> String {
    if let Some(token) = bearer_token(headers) {
        return token.to_string();
    }
    addr.map(|a| a.ip().to_string()).unwrap_or_else(|| "anonymous".to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get("Authorization")?.to_str().ok()?.strip_prefix("Bearer ")
}

fn is_localhost(addr: Option<SocketAddr>) -> bool {
    addr.is_some_and(|a| a.ip().is_loopback())
}

/// Requires a paired bearer token on every route except `/health` and
/// `/pair`. Before any device has paired (`devices.is_empty()`), access is
/// open so the first pairing can happen at all.
async fn auth_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path().to_string();
    if path == "/health" || path == "/pair" {
        return Ok(next.run(req).await);
    }

    if state.gateway.devices.is_empty() {
        return Ok(next.run(req).await);
    }

    let Some(token) = bearer_token(req.headers()) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    if state.gateway.devices.authenticate(token).is_none() {
        warn!("rejected request with unknown bearer token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}

/// Enforces per-device, per-tier limits (§4.3). Localhost callers are
/// exempt from rate limiting (but not from auth).
async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let addr = connect_info.map(|ConnectInfo(addr)| addr);
    let path = req.uri().path().to_string();
    if path == "/health" || is_localhost(addr) {
        return next.run(req).await;
    }

    let device = device_key(req.headers(), addr);
    let decision = state.gateway.rate_limiter.check(&device, &path);

    if !decision.allowed {
        return rate_limit_denied_response(&decision);
    }

    state.gateway.rate_limiter.record(&device, decision.tier);

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit-Minute", HeaderValue::from(decision.limit_minute));
    headers.insert("X-RateLimit-Remaining-Minute", HeaderValue::from(decision.remaining_minute));
    if let Ok(v) = HeaderValue::from_str(&decision.tier.to_string()) {
        headers.insert("X-RateLimit-Tier", v);
    }
    response
}

fn rate_limit_denied_response(decision: &RateLimitDecision) -> Response {
    let retry_after_seconds = decision.retry_after_seconds.unwrap_or(1.0);
    let retry_after = retry_after_seconds.ceil().max(1.0) as u64;
    let body = Json(json!({
        "error": "rate_limit_exceeded",
        "message": format!("rate limit exceeded for tier {}", decision.tier),
        "tier": decision.tier.to_string(),
        "retry_after_seconds": retry_after_seconds,
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
        headers.insert("Retry-After", v);
    }
    if let Ok(v) = HeaderValue::from_str(&decision.tier.to_string()) {
        headers.insert("X-RateLimit-Tier", v);
    }
    response
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    require_pairing: bool,
    cloud_enabled: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        require_pairing: state.gateway.config.gateway.require_pairing,
        cloud_enabled: state.gateway.config.policy.cloud_enabled,
    })
}

#[derive(Deserialize)]
struct PairRequest {
    code: String,
    display_name: String,
    device_type: String,
}

#[derive(Serialize)]
struct PairResponse {
    token: String,
    device_id: String,
}

async fn pair_handler(State(state): State<AppState>, Json(payload): Json<PairRequest>) -> Result<Json<PairResponse>, StatusCode> {
    match state.gateway.devices.complete_pairing(&payload.code, &payload.display_name, &payload.device_type) {
        Some((token, device)) => Ok(Json(PairResponse { token, device_id: device.id })),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[derive(Serialize)]
struct StatusResponse {
    device_id: Option<String>,
    cost: wizard_telemetry::CostStatus,
    policy: wizard_policy::PolicyStatus,
    rate_limit: std::collections::HashMap<String, RateLimitDecision>,
}

async fn status_handler(State(state): State<AppState>, headers: HeaderMap) -> Json<StatusResponse> {
    let device_id = bearer_token(&headers).map(|t| t.to_string());
    let rate_limit = device_id.as_deref().map(|d| state.gateway.rate_limiter.device_snapshot(d)).unwrap_or_default();

    Json(StatusResponse {
        device_id,
        cost: state.gateway.cost_tracker.status(),
        policy: state.gateway.policy.status(),
        rate_limit,
    })
}

async fn rate_limits_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Json<serde_json::Value> {
    let addr = connect_info.map(|ConnectInfo(addr)| addr);
    let device = device_key(&headers, addr);
    Json(json!({
        "device": device,
        "tiers": state.gateway.rate_limiter.device_snapshot(&device),
        "global": state.gateway.rate_limiter.stats(),
    }))
}

async fn complete_handler(State(state): State<AppState>, Json(request): Json<CompletionGatewayRequest>) -> impl IntoResponse {
    let ctx = PipelineContext {
        backend_router: &state.gateway.backend_router,
        cost_tracker: &state.gateway.cost_tracker,
        policy: &state.gateway.policy,
        quota: &state.gateway.quota,
        failures: &state.gateway.failures,
    };

    let response = pipeline::run(&ctx, request).await;
    let status = if response.success {
        StatusCode::OK
    } else {
        response
            .error
            .as_ref()
            .map(|e| error_code_to_status(e.code))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    };
    (status, Json(response))
}

fn error_code_to_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::UnsupportedOperation => StatusCode::BAD_REQUEST,
        ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCode::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Deserialize)]
struct SyncQuery {
    #[serde(default = "default_mission_id")]
    mission_id: String,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

fn default_mission_id() -> String {
    "core".to_string()
}

async fn sync_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    axum::extract::Query(query): axum::extract::Query<SyncQuery>,
) -> impl IntoResponse {
    let mission_id = query.mission_id.as_str();
    let limit = query.limit.unwrap_or(50);

    match kind.as_str() {
        "calendar" => Json(json!(state.orchestrator.sync_calendar(mission_id, 7).await)).into_response(),
        "email" => {
            let q = query.query.as_deref().unwrap_or("is:unread");
            Json(json!(state.orchestrator.sync_email(mission_id, q, limit).await)).into_response()
        }
        "jira" | "linear" => {
            let q = query.query.as_deref().unwrap_or("");
            Json(json!(state.orchestrator.sync_issues(&kind, mission_id, q, limit).await)).into_response()
        }
        "slack" => {
            let channel = query.channel_id.as_deref().unwrap_or("general");
            Json(json!(state.orchestrator.sync_chat(mission_id, channel, limit).await)).into_response()
        }
        "all" => Json(json!(state.orchestrator.sync_all(mission_id).await)).into_response(),
        "status" => Json(json!(state.orchestrator.history())).into_response(),
        other => {
            let body = Json(json!({
                "error": "invalid_input",
                "message": format!("unknown sync kind '{other}'"),
            }));
            (StatusCode::BAD_REQUEST, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use wizard_config::WizardConfig;
    use wizard_sync::StaticCredentialStore;

    fn test_app() -> Router {
        let state = Arc::new(GatewayState::new(WizardConfig::default()));
        let orchestrator = Arc::new(SyncOrchestrator::new(Box::new(StaticCredentialStore::new()), Box::new(crate::orchestrator::NoopTaskSink)));
        build_router(state, orchestrator)
    }

    #[tokio::test]
    async fn health_endpoint_is_open() {
        let app = test_app();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
