//! External Sync Orchestrator for the Wizard edge gateway (§4.6, §4.7).
//!
//! Providers pull typed records from calendar/email/issue-tracker/chat
//! systems; transformers project each record into the canonical task-item
//! shape. The debounce/batch event queue that drains providers on a
//! schedule lives in `wizard-syncqueue` — this crate owns the provider
//! contract, the provider-factory, the lazy provider registry, and the
//! transformer formulas.

pub mod factory;
pub mod provider;
pub mod registry;
pub mod transform;

pub use provider::{
    CalendarEvent, CalendarProvider, ChatMessage, ChatProvider, CredentialStore, EmailMessage,
    EmailProvider, Issue, IssueProvider, ProviderCredentials, ProviderSyncStatus,
    StaticCredentialStore, SyncError, SyncProvider,
};
pub use registry::ProviderRegistry;
pub use transform::{
    calendar_event_to_task_item, chat_message_to_task_item, email_message_to_task_item,
    issue_to_task_item, map_issue_status,
};
