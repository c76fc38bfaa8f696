//! Cost Tracker for the Wizard edge gateway (§3, §4.2 step 2).
//!
//! Tracks daily/monthly USD spend and request counts, with built-in
//! per-model pricing and auto-rolling windows at day/month boundaries.

pub mod cost_tracker;
pub mod pricing;

pub use cost_tracker::{CostStatus, CostTracker};
pub use pricing::{ModelPricing, PricingTable};

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
