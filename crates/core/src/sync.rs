//! Shared shapes for the sync orchestrator (§4.6) and transformers (§4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEventType {
    Create,
    Update,
    Delete,
}

/// `{id, provider, event_type, payload, timestamp, processed, retry_count}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    pub id: String,
    pub provider: String,
    pub event_type: SyncEventType,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub processed: bool,
    pub retry_count: u32,
}

impl SyncEvent {
    pub fn new(id: impl Into<String>, provider: impl Into<String>, event_type: SyncEventType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            event_type,
            payload,
            timestamp: Utc::now(),
            processed: false,
            retry_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskItemType {
    Task,
    Issue,
}

/// The canonical downstream shape every provider-specific record transforms
/// into (§4.7). `metadata.external_id` must always equal the source record
/// id — one of the universal invariants in §8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: TaskItemType,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub parent_mission: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TaskItem {
    pub fn external_id(&self) -> Option<&str> {
        self.metadata.get("external_id").and_then(|v| v.as_str())
    }
}

/// Per-provider sync history rollup: `{last_sync, synced_count, tasks_created, errors}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncHistoryEntry {
    pub last_sync: Option<DateTime<Utc>>,
    pub synced_count: u64,
    pub tasks_created: u64,
    pub errors: u64,
}

/// Structured result of one sync-flow run (§4.6 step 8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub status: String,
    pub provider: String,
    pub mission_id: String,
    pub timestamp: DateTime<Utc>,
    pub synced_count: u64,
    pub tasks_created: u64,
    pub errors: Vec<String>,
    pub tasks: Vec<TaskItem>,
}
