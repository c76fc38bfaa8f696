//! Debounce/batch event queue (§4.6).
//!
//! Accepts `SyncEvent`s keyed by provider. A provider's backlog drains only
//! once `now - last_sync[provider] >= debounce`, split into sub-batches of
//! `batch_size`, handed one at a time to that provider's registered
//! `BatchProcessor`. A single `processing` flag guards against re-entrancy
//! across concurrent `process_batch` calls — draining itself still proceeds
//! provider by provider, sequentially, the way the source does.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use wizard_core::sync::SyncEvent;

use crate::model::{BatchOutcome, ManualProcessResult, ProcessResult, ProviderDrainResult, QueueStatus};

#[derive(Debug, Error)]
pub enum SyncQueueError {
    #[error("no processor registered for provider '{0}'")]
    NoProcessor(String),
}

/// A registered per-provider callback that turns a batch of events into a
/// batch result (§4.6: "a registered per-provider processor callback
/// handles each batch and returns a batch result").
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    async fn process(&self, batch: &[SyncEvent]) -> Result<serde_json::Value, String>;
}

pub struct EventQueue {
    debounce_seconds: u64,
    batch_size: usize,
    #[allow(dead_code)]
    max_retries: u32,
    pending_events: RwLock<HashMap<String, Vec<SyncEvent>>>,
    last_sync: RwLock<HashMap<String, chrono::DateTime<Utc>>>,
    processing: AtomicBool,
    processors: RwLock<HashMap<String, Arc<dyn BatchProcessor>>>,
}

impl EventQueue {
    pub fn new(debounce_seconds: u64, batch_size: usize, max_retries: u32) -> Self {
        Self {
            debounce_seconds,
            batch_size,
            max_retries,
            pending_events: RwLock::new(HashMap::new()),
            last_sync: RwLock::new(HashMap::new()),
            processing: AtomicBool::new(false),
            processors: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_processor(&self, provider: impl Into<String>, processor: Arc<dyn BatchProcessor>) {
        let provider = provider.into();
        info!(provider = %provider, "Registered event processor");
        self.processors.write().await.insert(provider, processor);
    }

    /// Add an event to the queue. Safe under concurrent producers.
    pub async fn enqueue(&self, event: SyncEvent) {
        let key = event.provider.clone();
        debug!(provider = %key, event_id = %event.id, "Enqueued event");
        self.pending_events.write().await.entry(key).or_default().push(event);
    }

    async fn should_process(&self, provider: &str) -> bool {
        let last_sync = self.last_sync.read().await;
        match last_sync.get(provider) {
            None => true,
            Some(last) => (Utc::now() - *last).num_seconds() as u64 >= self.debounce_seconds,
        }
    }

    /// Drain queued events, respecting debounce and batch size. If
    /// `provider` is `None`, every provider with a non-empty backlog is
    /// considered. Returns `{status: "processing", skipped: true}`-equivalent
    /// if a drain is already underway.
    pub async fn process_batch(&self, provider: Option<&str>) -> ProcessResult {
        if self.processing.swap(true, Ordering::SeqCst) {
            debug!("Processing already in progress, skipping");
            return ProcessResult::skipped();
        }

        let result = self.drain(provider).await;
        self.processing.store(false, Ordering::SeqCst);
        result
    }

    async fn drain(&self, provider: Option<&str>) -> ProcessResult {
        let providers_to_process: Vec<String> = match provider {
            Some(p) => vec![p.to_string()],
            None => self.pending_events.read().await.keys().cloned().collect(),
        };

        let mut providers = HashMap::new();

        for prov in providers_to_process {
            let events = {
                let pending = self.pending_events.read().await;
                match pending.get(&prov) {
                    Some(events) if !events.is_empty() => events.clone(),
                    _ => continue,
                }
            };

            if !self.should_process(&prov).await {
                debug!(provider = %prov, "Debounce interval not met, skipping batch");
                continue;
            }

            let processor = {
                let processors = self.processors.read().await;
                match processors.get(&prov) {
                    Some(p) => p.clone(),
                    None => {
                        warn!(provider = %prov, "No processor registered");
                        continue;
                    }
                }
            };

            info!(provider = %prov, count = events.len(), "Processing batch");

            let mut batch_results = Vec::new();
            for (batch_idx, batch) in events.chunks(self.batch_size).enumerate() {
                match processor.process(batch).await {
                    Ok(result) => {
                        info!(provider = %prov, batch = batch_idx, count = batch.len(), "Batch processed");
                        batch_results.push(BatchOutcome::Success {
                            batch: batch_idx,
                            count: batch.len(),
                            result,
                        });
                    }
                    Err(error) => {
                        warn!(provider = %prov, batch = batch_idx, %error, "Batch processing failed");
                        batch_results.push(BatchOutcome::Error {
                            batch: batch_idx,
                            count: batch.len(),
                            error,
                        });
                    }
                }
            }

            self.last_sync.write().await.insert(prov.clone(), Utc::now());
            self.pending_events.write().await.insert(prov.clone(), Vec::new());

            providers.insert(
                prov,
                ProviderDrainResult {
                    status: "completed".to_string(),
                    total_events: events.len(),
                    batches: batch_results,
                },
            );
        }

        ProcessResult {
            status: "success".to_string(),
            timestamp: Utc::now(),
            providers,
        }
    }

    pub async fn status(&self) -> QueueStatus {
        let pending = self.pending_events.read().await;
        let last_sync = self.last_sync.read().await;
        QueueStatus {
            processing: self.processing.load(Ordering::SeqCst),
            pending_events_by_provider: pending
                .iter()
                .filter(|(_, events)| !events.is_empty())
                .map(|(k, v)| (k.clone(), v.len()))
                .collect(),
            last_sync_by_provider: last_sync.clone(),
            debounce_seconds: self.debounce_seconds,
            batch_size: self.batch_size,
        }
    }

    /// Clear pending events for one provider, or every provider if `None`.
    pub async fn clear_queue(&self, provider: Option<&str>) {
        match provider {
            Some(p) => {
                self.pending_events.write().await.insert(p.to_string(), Vec::new());
                info!(provider = p, "Cleared queue");
            }
            None => {
                self.pending_events.write().await.clear();
                info!("Cleared all event queues");
            }
        }
    }

    /// Process a list of events immediately, bypassing debounce and
    /// batching entirely — for operator-triggered or test-triggered
    /// immediate processing.
    pub async fn manual_process(&self, events: Vec<SyncEvent>) -> Result<ManualProcessResult, SyncQueueError> {
        info!(count = events.len(), "Manual processing");

        let mut by_provider: HashMap<String, Vec<SyncEvent>> = HashMap::new();
        for event in &events {
            by_provider.entry(event.provider.clone()).or_default().push(event.clone());
        }

        let mut results = HashMap::new();
        for (provider, prov_events) in by_provider {
            let processor = {
                let processors = self.processors.read().await;
                match processors.get(&provider) {
                    Some(p) => p.clone(),
                    None => {
                        warn!(provider = %provider, "No processor for manual_process");
                        continue;
                    }
                }
            };
            match processor.process(&prov_events).await {
                Ok(result) => {
                    results.insert(provider, result);
                }
                Err(error) => {
                    results.insert(provider, serde_json::json!({ "error": error }));
                }
            }
        }

        Ok(ManualProcessResult {
            status: "success".to_string(),
            processed_count: events.len(),
            results,
        })
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(30, 50, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizard_core::sync::SyncEventType;

    struct CountingProcessor;

    #[async_trait]
    impl BatchProcessor for CountingProcessor {
        async fn process(&self, batch: &[SyncEvent]) -> Result<serde_json::Value, String> {
            Ok(serde_json::json!({ "count": batch.len() }))
        }
    }

    struct FailingProcessor;

    #[async_trait]
    impl BatchProcessor for FailingProcessor {
        async fn process(&self, _batch: &[SyncEvent]) -> Result<serde_json::Value, String> {
            Err("boom".to_string())
        }
    }

    fn event(provider: &str, id: &str) -> SyncEvent {
        SyncEvent::new(id, provider, SyncEventType::Create, serde_json::json!({}))
    }

    #[tokio::test]
    async fn enqueue_and_status_report_pending_counts() {
        let queue = EventQueue::default();
        queue.enqueue(event("gmail", "e1")).await;
        queue.enqueue(event("gmail", "e2")).await;

        let status = queue.status().await;
        assert_eq!(status.pending_events_by_provider.get("gmail"), Some(&2));
        assert!(!status.processing);
    }

    #[tokio::test]
    async fn process_batch_without_processor_is_a_no_op() {
        let queue = EventQueue::default();
        queue.enqueue(event("gmail", "e1")).await;

        let result = queue.process_batch(None).await;
        assert_eq!(result.status, "success");
        assert!(result.providers.is_empty());
    }

    #[tokio::test]
    async fn process_batch_drains_and_clears_the_queue() {
        let queue = EventQueue::new(0, 50, 3);
        queue.register_processor("gmail", Arc::new(CountingProcessor)).await;
        queue.enqueue(event("gmail", "e1")).await;
        queue.enqueue(event("gmail", "e2")).await;

        let result = queue.process_batch(None).await;
        let provider_result = result.providers.get("gmail").unwrap();
        assert_eq!(provider_result.total_events, 2);
        assert_eq!(provider_result.batches.len(), 1);

        let status = queue.status().await;
        assert!(status.pending_events_by_provider.is_empty());
        assert!(status.last_sync_by_provider.contains_key("gmail"));
    }

    #[tokio::test]
    async fn debounce_blocks_a_second_immediate_drain() {
        let queue = EventQueue::new(3600, 50, 3);
        queue.register_processor("gmail", Arc::new(CountingProcessor)).await;
        queue.enqueue(event("gmail", "e1")).await;
        queue.process_batch(None).await;

        queue.enqueue(event("gmail", "e2")).await;
        let result = queue.process_batch(None).await;
        assert!(result.providers.is_empty());
    }

    #[tokio::test]
    async fn failed_batches_are_recorded_but_queue_still_clears() {
        let queue = EventQueue::new(0, 50, 3);
        queue.register_processor("gmail", Arc::new(FailingProcessor)).await;
        queue.enqueue(event("gmail", "e1")).await;

        let result = queue.process_batch(None).await;
        let provider_result = result.providers.get("gmail").unwrap();
        assert!(matches!(provider_result.batches[0], BatchOutcome::Error { .. }));

        let status = queue.status().await;
        assert!(status.pending_events_by_provider.is_empty());
    }

    #[tokio::test]
    async fn batch_size_splits_a_large_backlog() {
        let queue = EventQueue::new(0, 2, 3);
        queue.register_processor("gmail", Arc::new(CountingProcessor)).await;
        for i in 0..5 {
            queue.enqueue(event("gmail", &format!("e{i}"))).await;
        }

        let result = queue.process_batch(None).await;
        let provider_result = result.providers.get("gmail").unwrap();
        assert_eq!(provider_result.batches.len(), 3);
    }

    #[tokio::test]
    async fn clear_queue_removes_pending_events() {
        let queue = EventQueue::default();
        queue.enqueue(event("gmail", "e1")).await;
        queue.clear_queue(Some("gmail")).await;
        assert!(queue.status().await.pending_events_by_provider.is_empty());
    }

    #[tokio::test]
    async fn manual_process_bypasses_debounce() {
        let queue = EventQueue::new(3600, 50, 3);
        queue.register_processor("gmail", Arc::new(CountingProcessor)).await;

        let events = vec![event("gmail", "e1"), event("gmail", "e2")];
        let result = queue.manual_process(events).await.unwrap();
        assert_eq!(result.processed_count, 2);
        assert!(result.results.contains_key("gmail"));
    }
}
