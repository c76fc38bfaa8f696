//! Provider contract for the sync orchestrator (§4.6).
//!
//! A provider authenticates against an external system, fetches its
//! type-specific records, and reports its own sync status. Calendar,
//! email, issue-tracker, and chat providers each specialize the shape
//! with their own record type and `fetch…` method.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no credentials cached for provider '{0}'")]
    NoCredentials(String),

    #[error("authentication failed for provider '{0}'")]
    AuthenticationFailed(String),

    #[error("unknown provider key '{0}'")]
    UnknownProvider(String),

    #[error("provider request failed: {0}")]
    RequestFailed(String),
}

/// Opaque credential bundle handed to `authenticate`. Backed in production
/// by an OAuth-token cache keyed by provider name (see [`CredentialStore`]).
pub type ProviderCredentials = HashMap<String, String>;

/// Looks up cached credentials for a provider ahead of `authenticate`.
/// Production implementations back this with an encrypted token store;
/// the sync orchestrator only needs the lookup contract.
pub trait CredentialStore: Send + Sync {
    fn get(&self, provider: &str) -> Option<ProviderCredentials>;
}

/// An in-memory credential store, useful for tests and for providers that
/// are configured with a static token at startup.
#[derive(Debug, Default)]
pub struct StaticCredentialStore {
    credentials: HashMap<String, ProviderCredentials>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, provider: impl Into<String>, credentials: ProviderCredentials) {
        self.credentials.insert(provider.into(), credentials);
    }
}

impl CredentialStore for StaticCredentialStore {
    fn get(&self, provider: &str) -> Option<ProviderCredentials> {
        self.credentials.get(provider).cloned()
    }
}

/// `{provider, authenticated, last_sync}` — returned by `get_sync_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSyncStatus {
    pub provider: String,
    pub authenticated: bool,
    pub last_sync: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SyncProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn authenticate(&self, credentials: &ProviderCredentials) -> Result<bool, SyncError>;
    async fn get_sync_status(&self) -> ProviderSyncStatus;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
    pub provider: String,
    pub is_all_day: bool,
}

#[async_trait]
pub trait CalendarProvider: SyncProvider {
    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, SyncError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub message_id: String,
    pub subject: String,
    pub from_addr: String,
    pub to_addrs: Vec<String>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub thread_id: Option<String>,
    pub labels: Vec<String>,
    pub attachments: Vec<String>,
    pub provider: String,
    pub is_unread: bool,
}

#[async_trait]
pub trait EmailProvider: SyncProvider {
    async fn fetch_messages(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, SyncError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub provider: String,
    pub custom_fields: HashMap<String, serde_json::Value>,
}

#[async_trait]
pub trait IssueProvider: SyncProvider {
    async fn fetch_issues(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Issue>, SyncError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub thread_ts: Option<String>,
    pub attachments: Vec<String>,
    pub reactions: HashMap<String, u32>,
}

#[async_trait]
pub trait ChatProvider: SyncProvider {
    async fn fetch_channel_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, SyncError>;
}
