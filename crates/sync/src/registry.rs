//! Provider registry — lazily constructs and caches provider instances by
//! key. Mirrors the gateway's channel registry: callers ask for a provider
//! by name, the registry looks up an already-built instance or builds one
//! via the provider-factory and caches it (§3 Ownership: "provider
//! instances (lazy)").

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::factory;
use crate::provider::{
    CalendarProvider, ChatProvider, EmailProvider, IssueProvider, ProviderSyncStatus, SyncError,
    SyncProvider,
};

enum ProviderHandle {
    Calendar(Arc<dyn CalendarProvider>),
    Email(Arc<dyn EmailProvider>),
    Issue(Arc<dyn IssueProvider>),
    Chat(Arc<dyn ChatProvider>),
}

impl ProviderHandle {
    fn as_sync_provider(&self) -> &dyn SyncProvider {
        match self {
            ProviderHandle::Calendar(p) => p.as_ref(),
            ProviderHandle::Email(p) => p.as_ref(),
            ProviderHandle::Issue(p) => p.as_ref(),
            ProviderHandle::Chat(p) => p.as_ref(),
        }
    }
}

/// Central registry holding all lazily-constructed provider instances.
#[derive(Default)]
pub struct ProviderRegistry {
    handles: Mutex<HashMap<String, ProviderHandle>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or lazily construct the calendar provider for `key`.
    pub async fn calendar(&self, key: &str) -> Result<Arc<dyn CalendarProvider>, SyncError> {
        let mut handles = self.handles.lock().await;
        if let Some(ProviderHandle::Calendar(p)) = handles.get(key) {
            return Ok(p.clone());
        }
        let provider = factory::make_calendar_provider(key)?;
        info!(provider = key, "Lazily constructed calendar provider");
        handles.insert(key.to_string(), ProviderHandle::Calendar(provider.clone()));
        Ok(provider)
    }

    /// Get or lazily construct the email provider for `key`.
    pub async fn email(&self, key: &str) -> Result<Arc<dyn EmailProvider>, SyncError> {
        let mut handles = self.handles.lock().await;
        if let Some(ProviderHandle::Email(p)) = handles.get(key) {
            return Ok(p.clone());
        }
        let provider = factory::make_email_provider(key)?;
        info!(provider = key, "Lazily constructed email provider");
        handles.insert(key.to_string(), ProviderHandle::Email(provider.clone()));
        Ok(provider)
    }

    /// Get or lazily construct the issue-tracker provider for `key`.
    pub async fn issue(&self, key: &str) -> Result<Arc<dyn IssueProvider>, SyncError> {
        let mut handles = self.handles.lock().await;
        if let Some(ProviderHandle::Issue(p)) = handles.get(key) {
            return Ok(p.clone());
        }
        let provider = factory::make_issue_provider(key)?;
        info!(provider = key, "Lazily constructed issue-tracker provider");
        handles.insert(key.to_string(), ProviderHandle::Issue(provider.clone()));
        Ok(provider)
    }

    /// Get or lazily construct the chat provider for `key`.
    pub async fn chat(&self, key: &str) -> Result<Arc<dyn ChatProvider>, SyncError> {
        let mut handles = self.handles.lock().await;
        if let Some(ProviderHandle::Chat(p)) = handles.get(key) {
            return Ok(p.clone());
        }
        let provider = factory::make_chat_provider(key)?;
        info!(provider = key, "Lazily constructed chat provider");
        handles.insert(key.to_string(), ProviderHandle::Chat(provider.clone()));
        Ok(provider)
    }

    /// Names of every provider constructed so far.
    pub async fn list(&self) -> Vec<String> {
        self.handles.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.lock().await.is_empty()
    }

    /// Run `get_sync_status` on every constructed provider.
    pub async fn health_check_all(&self) -> HashMap<String, ProviderSyncStatus> {
        let handles = self.handles.lock().await;
        let mut results = HashMap::new();
        for (name, handle) in handles.iter() {
            results.insert(name.clone(), handle.as_sync_provider().get_sync_status().await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_registry() {
        let reg = ProviderRegistry::new();
        assert!(reg.is_empty().await);
        assert_eq!(reg.len().await, 0);
    }

    #[tokio::test]
    async fn lazy_construction_caches_the_instance() {
        let reg = ProviderRegistry::new();
        let first = reg.calendar("google_calendar").await.unwrap();
        let second = reg.calendar("google_calendar").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(reg.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_provider_key_is_rejected() {
        let reg = ProviderRegistry::new();
        assert!(reg.calendar("outlook_calendar").await.is_err());
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn different_families_coexist_in_one_registry() {
        let reg = ProviderRegistry::new();
        reg.calendar("google_calendar").await.unwrap();
        reg.email("gmail").await.unwrap();
        reg.issue("jira").await.unwrap();
        reg.chat("slack").await.unwrap();
        assert_eq!(reg.len().await, 4);
        assert!(reg.list().await.contains(&"slack".to_string()));
    }

    #[tokio::test]
    async fn health_check_all_reports_unauthenticated_until_authenticate_runs() {
        let reg = ProviderRegistry::new();
        reg.calendar("google_calendar").await.unwrap();
        let health = reg.health_check_all().await;
        assert_eq!(health.get("google_calendar").unwrap().authenticated, false);
    }
}
