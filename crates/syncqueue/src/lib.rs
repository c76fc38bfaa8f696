//! Event queue for the External Sync Orchestrator (§4.6).
//!
//! Debounces and batches `SyncEvent`s per provider, draining each
//! provider's backlog through a registered `BatchProcessor` once the
//! debounce interval has elapsed. The provider contract, the provider
//! registry, and the record-to-task-item transformers live in
//! `wizard-sync` — this crate owns only the queueing/scheduling half.

pub mod model;
pub mod queue;

pub use model::{BatchOutcome, ManualProcessResult, ProcessResult, ProviderDrainResult, QueueStatus};
pub use queue::{BatchProcessor, EventQueue, SyncQueueError};
