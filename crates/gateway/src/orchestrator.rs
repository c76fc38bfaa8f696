//! Sync flow driver for `POST /api/sync/<kind>` (§4.6). Wires the provider
//! registry and transformers from `wizard-sync` into the eight-step flow:
//! acquire provider, fetch credentials, authenticate, fetch records,
//! transform, persist, update history, return a structured result.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use wizard_core::sync::{SyncHistoryEntry, SyncResult, TaskItem};
use wizard_sync::{
    CredentialStore, ProviderRegistry, calendar_event_to_task_item, chat_message_to_task_item,
    email_message_to_task_item, issue_to_task_item,
};

/// Where transformed task items ultimately land. Persistence itself is out
/// of scope here (the store is an external collaborator); this trait is
/// the seam a real store implementation plugs into.
#[async_trait]
pub trait TaskSink: Send + Sync {
    async fn upsert(&self, item: &TaskItem);
}

/// Logs each item instead of persisting it. Stands in until a real store
/// adapter is wired up.
pub struct NoopTaskSink;

#[async_trait]
impl TaskSink for NoopTaskSink {
    async fn upsert(&self, item: &TaskItem) {
        tracing::debug!(task_id = %item.id, title = %item.title, "sync task item (no store configured)");
    }
}

pub struct SyncOrchestrator {
    registry: ProviderRegistry,
    credentials: Box<dyn CredentialStore>,
    sink: Box<dyn TaskSink>,
    history: Mutex<HashMap<String, SyncHistoryEntry>>,
}

impl SyncOrchestrator {
    pub fn new(credentials: Box<dyn CredentialStore>, sink: Box<dyn TaskSink>) -> Self {
        Self {
            registry: ProviderRegistry::new(),
            credentials,
            sink,
            history: Mutex::new(HashMap::new()),
        }
    }

    fn missing_credentials(&self, provider: &str, mission_id: &str) -> SyncResult {
        self.record_error(provider);
        SyncResult {
            status: "error".to_string(),
            provider: provider.to_string(),
            mission_id: mission_id.to_string(),
            timestamp: Utc::now(),
            synced_count: 0,
            tasks_created: 0,
            errors: vec![format!("no credentials cached for provider '{provider}'")],
            tasks: vec![],
        }
    }

    fn auth_failed(&self, provider: &str, mission_id: &str) -> SyncResult {
        self.record_error(provider);
        SyncResult {
            status: "error".to_string(),
            provider: provider.to_string(),
            mission_id: mission_id.to_string(),
            timestamp: Utc::now(),
            synced_count: 0,
            tasks_created: 0,
            errors: vec![format!("authentication failed for provider '{provider}'")],
            tasks: vec![],
        }
    }

    fn record_error(&self, provider: &str) {
        let mut history = self.history.lock().expect("sync history mutex poisoned");
        history.entry(provider.to_string()).or_default().errors += 1;
    }

    fn record_success(&self, provider: &str, tasks: &[TaskItem]) {
        let mut history = self.history.lock().expect("sync history mutex poisoned");
        let entry = history.entry(provider.to_string()).or_default();
        entry.last_sync = Some(Utc::now());
        entry.synced_count += tasks.len() as u64;
        entry.tasks_created += tasks.len() as u64;
    }

    async fn persist(&self, tasks: &[TaskItem]) {
        for task in tasks {
            self.sink.upsert(task).await;
        }
    }

    pub async fn sync_calendar(&self, mission_id: &str, window_days: i64) -> SyncResult {
        const PROVIDER: &str = "google_calendar";
        let provider = match self.registry.calendar(PROVIDER).await {
            Ok(p) => p,
            Err(e) => {
                warn!(provider = PROVIDER, error = %e, "failed to acquire calendar provider");
                return self.missing_credentials(PROVIDER, mission_id);
            }
        };

        let Some(credentials) = self.credentials.get(PROVIDER) else {
            return self.missing_credentials(PROVIDER, mission_id);
        };

        match provider.authenticate(&credentials).await {
            Ok(true) => {}
            _ => return self.auth_failed(PROVIDER, mission_id),
        }

        let now = Utc::now();
        let window = chrono::Duration::days(window_days);
        let events = match provider.fetch_events(now - window, now + window).await {
            Ok(events) => events,
            Err(e) => {
                self.record_error(PROVIDER);
                return error_result(PROVIDER, mission_id, e.to_string());
            }
        };

        let tasks: Vec<TaskItem> = events.iter().map(|event| calendar_event_to_task_item(event, mission_id)).collect();
        self.persist(&tasks).await;
        self.record_success(PROVIDER, &tasks);
        success_result(PROVIDER, mission_id, tasks)
    }

    pub async fn sync_email(&self, mission_id: &str, query: &str, limit: usize) -> SyncResult {
        const PROVIDER: &str = "gmail";
        let provider = match self.registry.email(PROVIDER).await {
            Ok(p) => p,
            Err(e) => {
                warn!(provider = PROVIDER, error = %e, "failed to acquire email provider");
                return self.missing_credentials(PROVIDER, mission_id);
            }
        };

        let Some(credentials) = self.credentials.get(PROVIDER) else {
            return self.missing_credentials(PROVIDER, mission_id);
        };

        match provider.authenticate(&credentials).await {
            Ok(true) => {}
            _ => return self.auth_failed(PROVIDER, mission_id),
        }

        let messages = match provider.fetch_messages(query, limit).await {
            Ok(messages) => messages,
            Err(e) => {
                self.record_error(PROVIDER);
                return error_result(PROVIDER, mission_id, e.to_string());
            }
        };

        let tasks: Vec<TaskItem> = messages.iter().map(|m| email_message_to_task_item(m, mission_id)).collect();
        self.persist(&tasks).await;
        self.record_success(PROVIDER, &tasks);
        success_result(PROVIDER, mission_id, tasks)
    }

    pub async fn sync_issues(&self, provider_key: &str, mission_id: &str, query: &str, limit: usize) -> SyncResult {
        let provider = match self.registry.issue(provider_key).await {
            Ok(p) => p,
            Err(e) => {
                warn!(provider = provider_key, error = %e, "failed to acquire issue-tracker provider");
                return self.missing_credentials(provider_key, mission_id);
            }
        };

        let Some(credentials) = self.credentials.get(provider_key) else {
            return self.missing_credentials(provider_key, mission_id);
        };

        match provider.authenticate(&credentials).await {
            Ok(true) => {}
            _ => return self.auth_failed(provider_key, mission_id),
        }

        let issues = match provider.fetch_issues(query, limit).await {
            Ok(issues) => issues,
            Err(e) => {
                self.record_error(provider_key);
                return error_result(provider_key, mission_id, e.to_string());
            }
        };

        let tasks: Vec<TaskItem> = issues.iter().map(|i| issue_to_task_item(i, mission_id)).collect();
        self.persist(&tasks).await;
        self.record_success(provider_key, &tasks);
        success_result(provider_key, mission_id, tasks)
    }

    pub async fn sync_chat(&self, mission_id: &str, channel_id: &str, limit: usize) -> SyncResult {
        const PROVIDER: &str = "slack";
        let provider = match self.registry.chat(PROVIDER).await {
            Ok(p) => p,
            Err(e) => {
                warn!(provider = PROVIDER, error = %e, "failed to acquire chat provider");
                return self.missing_credentials(PROVIDER, mission_id);
            }
        };

        let Some(credentials) = self.credentials.get(PROVIDER) else {
            return self.missing_credentials(PROVIDER, mission_id);
        };

        match provider.authenticate(&credentials).await {
            Ok(true) => {}
            _ => return self.auth_failed(PROVIDER, mission_id),
        }

        let messages = match provider.fetch_channel_messages(channel_id, limit).await {
            Ok(messages) => messages,
            Err(e) => {
                self.record_error(PROVIDER);
                return error_result(PROVIDER, mission_id, e.to_string());
            }
        };

        let tasks: Vec<TaskItem> = messages.iter().map(|m| chat_message_to_task_item(m, mission_id)).collect();
        self.persist(&tasks).await;
        self.record_success(PROVIDER, &tasks);
        success_result(PROVIDER, mission_id, tasks)
    }

    /// Runs every provider family in turn, same as the individual flows but
    /// collected into one result list (§6: `kind = all`).
    pub async fn sync_all(&self, mission_id: &str) -> Vec<SyncResult> {
        vec![
            self.sync_calendar(mission_id, 7).await,
            self.sync_email(mission_id, "is:unread", 50).await,
            self.sync_issues("jira", mission_id, "assignee = currentUser()", 50).await,
            self.sync_issues("linear", mission_id, "", 50).await,
            self.sync_chat(mission_id, "general", 50).await,
        ]
    }

    /// `{provider -> {last_sync, synced_count, tasks_created, errors}}`
    /// (§6: `kind = status`).
    pub fn history(&self) -> HashMap<String, SyncHistoryEntry> {
        self.history.lock().expect("sync history mutex poisoned").clone()
    }
}

fn success_result(provider: &str, mission_id: &str, tasks: Vec<TaskItem>) -> SyncResult {
    SyncResult {
        status: "ok".to_string(),
        provider: provider.to_string(),
        mission_id: mission_id.to_string(),
        timestamp: Utc::now(),
        synced_count: tasks.len() as u64,
        tasks_created: tasks.len() as u64,
        errors: vec![],
        tasks,
    }
}

fn error_result(provider: &str, mission_id: &str, reason: String) -> SyncResult {
    SyncResult {
        status: "error".to_string(),
        provider: provider.to_string(),
        mission_id: mission_id.to_string(),
        timestamp: Utc::now(),
        synced_count: 0,
        tasks_created: 0,
        errors: vec![reason],
        tasks: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizard_sync::StaticCredentialStore;

    fn orchestrator() -> SyncOrchestrator {
        SyncOrchestrator::new(Box::new(StaticCredentialStore::new()), Box::new(NoopTaskSink))
    }

    #[tokio::test]
    async fn missing_credentials_produces_an_error_result() {
        let orchestrator = orchestrator();
        let result = orchestrator.sync_calendar("mission-1", 7).await;
        assert_eq!(result.status, "error");
        assert!(result.errors[0].contains("no credentials"));
    }

    #[tokio::test]
    async fn authenticated_calendar_sync_with_no_events_succeeds_empty() {
        let mut store = StaticCredentialStore::new();
        let mut creds = HashMap::new();
        creds.insert("access_token".to_string(), "tok".to_string());
        store.set("google_calendar", creds);
        let orchestrator = SyncOrchestrator::new(Box::new(store), Box::new(NoopTaskSink));

        let result = orchestrator.sync_calendar("mission-1", 7).await;
        assert_eq!(result.status, "ok");
        assert_eq!(result.synced_count, 0);

        let history = orchestrator.history();
        assert!(history.get("google_calendar").unwrap().last_sync.is_some());
    }

    #[tokio::test]
    async fn history_counts_errors_across_attempts() {
        let orchestrator = orchestrator();
        orchestrator.sync_calendar("mission-1", 7).await;
        orchestrator.sync_calendar("mission-1", 7).await;
        let history = orchestrator.history();
        assert_eq!(history.get("google_calendar").unwrap().errors, 2);
    }
}
