//! Per-provider cloud quota tracker (§4.2 step 8). Distinct from the
//! gateway-wide cost/request budget in `wizard-telemetry`'s `CostTracker`:
//! this caps how many cloud calls a single provider may serve per day,
//! independent of dollar cost, so a misbehaving provider can't monopolize
//! the cloud route.

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

struct ProviderCount {
    date: NaiveDate,
    count: u64,
}

pub struct QuotaTracker {
    daily_caps: HashMap<String, u64>,
    counts: Mutex<HashMap<String, ProviderCount>>,
}

impl QuotaTracker {
    pub fn new(daily_caps: HashMap<String, u64>) -> Self {
        Self {
            daily_caps,
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// No cap configured for a provider means no quota — it never refuses.
    pub fn exceeded(&self, provider: &str) -> bool {
        let Some(cap) = self.daily_caps.get(provider) else {
            return false;
        };
        let today = Utc::now().date_naive();
        let counts = self.counts.lock().expect("quota mutex poisoned");
        match counts.get(provider) {
            Some(entry) if entry.date == today => entry.count >= *cap,
            _ => false,
        }
    }

    pub fn record(&self, provider: &str) {
        let today = Utc::now().date_naive();
        let mut counts = self.counts.lock().expect("quota mutex poisoned");
        let entry = counts.entry(provider.to_string()).or_insert(ProviderCount { date: today, count: 0 });
        if entry.date != today {
            entry.date = today;
            entry.count = 0;
        }
        entry.count += 1;
    }

    pub fn status(&self) -> HashMap<String, (u64, Option<u64>)> {
        let today = Utc::now().date_naive();
        let counts = self.counts.lock().expect("quota mutex poisoned");
        self.daily_caps
            .keys()
            .map(|provider| {
                let used = match counts.get(provider) {
                    Some(entry) if entry.date == today => entry.count,
                    _ => 0,
                };
                (provider.clone(), (used, self.daily_caps.get(provider).copied()))
            })
            .collect()
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_provider_never_exceeded() {
        let tracker = QuotaTracker::default();
        assert!(!tracker.exceeded("openrouter"));
    }

    #[test]
    fn capped_provider_denies_once_exhausted() {
        let mut caps = HashMap::new();
        caps.insert("openrouter".to_string(), 2);
        let tracker = QuotaTracker::new(caps);

        assert!(!tracker.exceeded("openrouter"));
        tracker.record("openrouter");
        assert!(!tracker.exceeded("openrouter"));
        tracker.record("openrouter");
        assert!(tracker.exceeded("openrouter"));
    }
}
