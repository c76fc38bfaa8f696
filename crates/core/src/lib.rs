//! # Wizard Core
//!
//! Domain types, traits, and error definitions for the Wizard edge gateway.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that every other crate implements against.
//!
//! ## Design philosophy
//!
//! Every subsystem's shared data shapes live here; the behavior that
//! produces and consumes them lives in the crate that owns that subsystem
//! (dispatcher, gateway, policy, sync). This keeps the dependency graph a
//! strict inward-pointing star: everything depends on `wizard-core`, nothing
//! depends back out of it.

pub mod classification;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod policy;
pub mod provider;
pub mod ratelimit;
pub mod sync;

pub use classification::{Backend as RouteBackend, Intent, Privacy, Route, SizeBucket, TaskClassification};
pub use device::{Device, DeviceStatus, PairingRequest, QrPayload, TrustLevel};
pub use dispatch::{DispatchContract, DispatchEnvelope, DispatchStatus, DispatchTarget, ShellPayload};
pub use error::{Error, ErrorCode, ErrorEnvelope, Result};
pub use policy::{PolicyViolation, Severity};
pub use provider::{Backend, BackendError, CompletionRequest, CompletionResponse, Usage};
pub use ratelimit::{RateLimitDecision, Tier, TierLimits, TierState, Window};
pub use sync::{SyncEvent, SyncEventType, SyncHistoryEntry, SyncResult, TaskItem, TaskItemType, TaskStatus};
