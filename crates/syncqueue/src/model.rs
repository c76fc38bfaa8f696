//! Result and status shapes for the event queue (§4.6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of one sub-batch within a provider's drain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Success { batch: usize, count: usize, result: serde_json::Value },
    Error { batch: usize, count: usize, error: String },
}

/// Result of draining one provider's queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDrainResult {
    pub status: String,
    pub total_events: usize,
    pub batches: Vec<BatchOutcome>,
}

/// Result of `process_batch` across every eligible provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResult {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub providers: HashMap<String, ProviderDrainResult>,
}

impl ProcessResult {
    pub fn skipped() -> Self {
        Self {
            status: "processing".to_string(),
            timestamp: Utc::now(),
            providers: HashMap::new(),
        }
    }
}

/// `{processing, pending_events_by_provider, last_sync_by_provider,
/// debounce_seconds, batch_size}` — the status-query shape from §4.6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub processing: bool,
    pub pending_events_by_provider: HashMap<String, usize>,
    pub last_sync_by_provider: HashMap<String, DateTime<Utc>>,
    pub debounce_seconds: u64,
    pub batch_size: usize,
}

/// Result of the `manual_process` escape hatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualProcessResult {
    pub status: String,
    pub processed_count: usize,
    pub results: HashMap<String, serde_json::Value>,
}
