//! The router contract check for the Completion Gateway (§4.2 step 5).
//!
//! Derives a contract intent (`design`/`chat`/`code`) from the task
//! classification, picks a model for that intent, and decides whether
//! cloud routing is reachable at all for this request (ghost mode,
//! private data, and offline-required requests are always local-only).

pub mod engine;
pub mod model;

pub use engine::{ContractRequest, enforce, evaluate};
pub use model::{ContractIntent, RouterContract};

/// Errors from the contract subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },
}
