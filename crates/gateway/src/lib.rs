//! HTTP gateway for the Wizard edge runtime.
//!
//! Exposes the Completion Gateway (§4.2), the per-device rate limiter
//! (§4.3), the task classifier (§4.5), and the external sync orchestrator
//! (§4.6) behind a small, bearer-authenticated JSON API (§6). Built on
//! Axum.

pub mod classifier;
pub mod devices;
pub mod failures;
pub mod orchestrator;
pub mod pipeline;
pub mod quota;
pub mod ratelimiter;
pub mod router;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use orchestrator::{NoopTaskSink, SyncOrchestrator};
use state::GatewayState;
use wizard_config::WizardConfig;
use wizard_sync::StaticCredentialStore;

/// Start the gateway HTTP server.
pub async fn start(config: WizardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    if config.gateway.require_pairing {
        info!("pairing required — use `wizard devices pair` to mint a bearer token");
    }

    let state = Arc::new(GatewayState::new(config));
    // TODO(sync-store): wire a real CredentialStore/TaskSink once the
    // external task store lands; until then, sync providers refuse
    // cleanly with "no credentials cached" and items are only logged.
    let orchestrator = Arc::new(SyncOrchestrator::new(Box::new(StaticCredentialStore::new()), Box::new(NoopTaskSink)));

    let app = router::build_router(state, orchestrator);

    info!(%addr, "gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
