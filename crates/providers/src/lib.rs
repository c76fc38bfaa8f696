//! Completion backend implementations for the Wizard edge gateway.
//!
//! All backends implement the `wizard_core::Backend` trait. The router
//! resolves a named backend from configuration for the Completion
//! Gateway's execute step (§4.2 step 9).

pub mod cloud;
pub mod local;
pub mod router;

pub use cloud::CloudBackend;
pub use local::LocalBackend;
pub use router::BackendRouter;
