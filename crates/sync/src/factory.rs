//! Provider-factory: maps a provider key (`gmail`, `google_calendar`,
//! `jira`, `linear`, `slack`) to a constructor.
//!
//! Each struct below is a stub — in production it would talk to the real
//! REST/GraphQL API for that provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::info;

use crate::provider::{
    CalendarEvent, CalendarProvider, ChatMessage, ChatProvider, EmailMessage, EmailProvider,
    Issue, IssueProvider, ProviderCredentials, ProviderSyncStatus, SyncError, SyncProvider,
};

struct ProviderState {
    authenticated: AtomicBool,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl ProviderState {
    fn new() -> Self {
        Self {
            authenticated: AtomicBool::new(false),
            last_sync: Mutex::new(None),
        }
    }

    async fn status(&self, provider: &str) -> ProviderSyncStatus {
        ProviderSyncStatus {
            provider: provider.to_string(),
            authenticated: self.authenticated.load(Ordering::SeqCst),
            last_sync: *self.last_sync.lock().await,
        }
    }

    async fn mark_synced(&self) {
        *self.last_sync.lock().await = Some(Utc::now());
    }
}

pub struct GoogleCalendarProvider {
    state: ProviderState,
}

impl GoogleCalendarProvider {
    pub fn new() -> Self {
        Self {
            state: ProviderState::new(),
        }
    }
}

#[async_trait]
impl SyncProvider for GoogleCalendarProvider {
    fn name(&self) -> &str {
        "google_calendar"
    }

    async fn authenticate(&self, credentials: &ProviderCredentials) -> Result<bool, SyncError> {
        let ok = credentials.contains_key("access_token");
        self.state.authenticated.store(ok, Ordering::SeqCst);
        Ok(ok)
    }

    async fn get_sync_status(&self) -> ProviderSyncStatus {
        self.state.status(self.name()).await
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, SyncError> {
        info!(
            provider = "google_calendar",
            %start, %end,
            "fetch_events (stub — would call Google Calendar API)"
        );
        self.state.mark_synced().await;
        Ok(Vec::new())
    }
}

pub struct GmailProvider {
    state: ProviderState,
}

impl GmailProvider {
    pub fn new() -> Self {
        Self {
            state: ProviderState::new(),
        }
    }
}

#[async_trait]
impl SyncProvider for GmailProvider {
    fn name(&self) -> &str {
        "gmail"
    }

    async fn authenticate(&self, credentials: &ProviderCredentials) -> Result<bool, SyncError> {
        let ok = credentials.contains_key("access_token");
        self.state.authenticated.store(ok, Ordering::SeqCst);
        Ok(ok)
    }

    async fn get_sync_status(&self) -> ProviderSyncStatus {
        self.state.status(self.name()).await
    }
}

#[async_trait]
impl EmailProvider for GmailProvider {
    async fn fetch_messages(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, SyncError> {
        info!(provider = "gmail", %query, limit, "fetch_messages (stub — would call Gmail API)");
        self.state.mark_synced().await;
        Ok(Vec::new())
    }
}

/// Backs both `jira` and `linear` — same contract, different upstream
/// GraphQL/REST surface, picked at construction time by key.
pub struct IssueTrackerProvider {
    provider_key: String,
    state: ProviderState,
}

impl IssueTrackerProvider {
    pub fn new(provider_key: &str) -> Self {
        Self {
            provider_key: provider_key.to_string(),
            state: ProviderState::new(),
        }
    }
}

#[async_trait]
impl SyncProvider for IssueTrackerProvider {
    fn name(&self) -> &str {
        &self.provider_key
    }

    async fn authenticate(&self, credentials: &ProviderCredentials) -> Result<bool, SyncError> {
        let ok = credentials.contains_key("api_token");
        self.state.authenticated.store(ok, Ordering::SeqCst);
        Ok(ok)
    }

    async fn get_sync_status(&self) -> ProviderSyncStatus {
        self.state.status(self.name()).await
    }
}

#[async_trait]
impl IssueProvider for IssueTrackerProvider {
    async fn fetch_issues(&self, query: &str, limit: usize) -> Result<Vec<Issue>, SyncError> {
        info!(
            provider = %self.provider_key, %query, limit,
            "fetch_issues (stub — would call the issue tracker's REST/GraphQL API)"
        );
        self.state.mark_synced().await;
        Ok(Vec::new())
    }
}

pub struct SlackChatProvider {
    state: ProviderState,
}

impl SlackChatProvider {
    pub fn new() -> Self {
        Self {
            state: ProviderState::new(),
        }
    }
}

#[async_trait]
impl SyncProvider for SlackChatProvider {
    fn name(&self) -> &str {
        "slack"
    }

    async fn authenticate(&self, credentials: &ProviderCredentials) -> Result<bool, SyncError> {
        let ok = credentials.contains_key("bot_token");
        self.state.authenticated.store(ok, Ordering::SeqCst);
        Ok(ok)
    }

    async fn get_sync_status(&self) -> ProviderSyncStatus {
        self.state.status(self.name()).await
    }
}

#[async_trait]
impl ChatProvider for SlackChatProvider {
    async fn fetch_channel_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, SyncError> {
        info!(provider = "slack", %channel_id, limit, "fetch_channel_messages (stub — would call conversations.history)");
        self.state.mark_synced().await;
        Ok(Vec::new())
    }
}

pub fn make_calendar_provider(key: &str) -> Result<Arc<dyn CalendarProvider>, SyncError> {
    match key {
        "google_calendar" => Ok(Arc::new(GoogleCalendarProvider::new())),
        other => Err(SyncError::UnknownProvider(other.to_string())),
    }
}

pub fn make_email_provider(key: &str) -> Result<Arc<dyn EmailProvider>, SyncError> {
    match key {
        "gmail" => Ok(Arc::new(GmailProvider::new())),
        other => Err(SyncError::UnknownProvider(other.to_string())),
    }
}

pub fn make_issue_provider(key: &str) -> Result<Arc<dyn IssueProvider>, SyncError> {
    match key {
        "jira" | "linear" => Ok(Arc::new(IssueTrackerProvider::new(key))),
        other => Err(SyncError::UnknownProvider(other.to_string())),
    }
}

pub fn make_chat_provider(key: &str) -> Result<Arc<dyn ChatProvider>, SyncError> {
    match key {
        "slack" => Ok(Arc::new(SlackChatProvider::new())),
        other => Err(SyncError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(key: &str, value: &str) -> ProviderCredentials {
        let mut m = ProviderCredentials::new();
        m.insert(key.to_string(), value.to_string());
        m
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            make_calendar_provider("outlook_calendar"),
            Err(SyncError::UnknownProvider(_))
        ));
        assert!(matches!(
            make_email_provider("imap"),
            Err(SyncError::UnknownProvider(_))
        ));
        assert!(matches!(
            make_issue_provider("trello"),
            Err(SyncError::UnknownProvider(_))
        ));
        assert!(matches!(
            make_chat_provider("discord"),
            Err(SyncError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn calendar_provider_authenticates_with_access_token() {
        let provider = make_calendar_provider("google_calendar").unwrap();
        assert!(!provider.authenticate(&creds("nothing", "x")).await.unwrap());
        assert!(provider.authenticate(&creds("access_token", "tok")).await.unwrap());
    }

    #[tokio::test]
    async fn jira_and_linear_share_the_issue_tracker_provider() {
        let jira = make_issue_provider("jira").unwrap();
        let linear = make_issue_provider("linear").unwrap();
        assert_eq!(jira.name(), "jira");
        assert_eq!(linear.name(), "linear");
    }

    #[tokio::test]
    async fn fetch_updates_last_sync() {
        let provider = make_calendar_provider("google_calendar").unwrap();
        let before = provider.get_sync_status().await;
        assert!(before.last_sync.is_none());

        let now = Utc::now();
        provider.fetch_events(now, now).await.unwrap();
        let after = provider.get_sync_status().await;
        assert!(after.last_sync.is_some());
    }
}
