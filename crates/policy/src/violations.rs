//! Bounded violation log (§4.4). Every rule that fires appends a
//! [`PolicyViolation`]; the log keeps only the most recent
//! `capacity` entries but remembers the all-time count separately.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, warn};
use wizard_core::policy::{PolicyViolation, Severity};

pub struct ViolationLog {
    capacity: usize,
    entries: Mutex<VecDeque<PolicyViolation>>,
    total: AtomicUsize,
}

impl ViolationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
            total: AtomicUsize::new(0),
        }
    }

    pub fn record(&self, violation: PolicyViolation) {
        match violation.severity {
            Severity::Warning => {
                warn!(rule = %violation.rule, task_id = %violation.task_id, "{}", violation.reason)
            }
            Severity::Error => {
                error!(rule = %violation.rule, task_id = %violation.task_id, "{}", violation.reason)
            }
        }

        self.total.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().expect("violation log mutex poisoned");
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(violation);
    }

    /// All-time count of violations recorded, independent of the bound.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// The most recent `n` violations still held in the log, oldest first.
    pub fn recent(&self, n: usize) -> Vec<PolicyViolation> {
        let entries = self.entries.lock().expect("violation log mutex poisoned");
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("violation log mutex poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizard_core::policy::Severity;

    fn violation(id: &str) -> PolicyViolation {
        PolicyViolation::new(id, "privacy_enforcement", "test reason", Severity::Error)
    }

    #[test]
    fn records_and_counts() {
        let log = ViolationLog::new(10);
        log.record(violation("t1"));
        log.record(violation("t2"));
        assert_eq!(log.total(), 2);
        assert_eq!(log.recent(5).len(), 2);
    }

    #[test]
    fn bounded_capacity_drops_oldest() {
        let log = ViolationLog::new(2);
        log.record(violation("t1"));
        log.record(violation("t2"));
        log.record(violation("t3"));

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].task_id, "t2");
        assert_eq!(recent[1].task_id, "t3");
        // total tracks all-time, not just what remains in the ring.
        assert_eq!(log.total(), 3);
    }

    #[test]
    fn recent_respects_requested_count() {
        let log = ViolationLog::new(10);
        for i in 0..5 {
            log.record(violation(&format!("t{i}")));
        }
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(2)[1].task_id, "t4");
    }

    #[test]
    fn clear_empties_the_ring_but_keeps_total() {
        let log = ViolationLog::new(10);
        log.record(violation("t1"));
        log.clear();
        assert_eq!(log.recent(10).len(), 0);
        assert_eq!(log.total(), 1);
    }
}
