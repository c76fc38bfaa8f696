//! Cost Tracker (§3 / §4.2 step 2) — daily and monthly USD budgets with
//! auto-rolling windows, owned by the gateway and mutated once per
//! completion request.

use crate::pricing::PricingTable;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Mutex;

struct State {
    spent_today: f64,
    spent_this_month: f64,
    last_daily_reset: NaiveDate,
    last_monthly_reset: (i32, u32),
    requests_today: u64,
    total_requests: u64,
}

pub struct CostTracker {
    pricing: PricingTable,
    daily_budget: f64,
    monthly_budget: f64,
    max_requests_per_day: u64,
    state: Mutex<State>,
}

impl CostTracker {
    pub fn new(daily_budget: f64, monthly_budget: f64, max_requests_per_day: u64) -> Self {
        let now = Utc::now();
        Self {
            pricing: PricingTable::with_defaults(),
            daily_budget,
            monthly_budget,
            max_requests_per_day,
            state: Mutex::new(State {
                spent_today: 0.0,
                spent_this_month: 0.0,
                last_daily_reset: now.date_naive(),
                last_monthly_reset: (now.year(), now.month()),
                requests_today: 0,
                total_requests: 0,
            }),
        }
    }

    pub fn with_pricing(
        daily_budget: f64,
        monthly_budget: f64,
        max_requests_per_day: u64,
        pricing: PricingTable,
    ) -> Self {
        let mut tracker = Self::new(daily_budget, monthly_budget, max_requests_per_day);
        tracker.pricing = pricing;
        tracker
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Roll the daily/monthly windows forward if the calendar date/month
    /// has advanced since the last call. Idempotent within a day.
    pub fn check_resets(&self) {
        let now = Utc::now();
        let today = now.date_naive();
        let month = (now.year(), now.month());
        let mut state = self.state.lock().expect("cost tracker mutex poisoned");

        if state.last_daily_reset != today {
            state.spent_today = 0.0;
            state.requests_today = 0;
            state.last_daily_reset = today;
        }

        if state.last_monthly_reset != month {
            state.spent_this_month = 0.0;
            state.last_monthly_reset = month;
        }
    }

    /// True once today's spend has reached the daily budget.
    pub fn budget_exceeded(&self) -> bool {
        let state = self.state.lock().expect("cost tracker mutex poisoned");
        state.spent_today >= self.daily_budget
    }

    /// True once today's request count has reached the daily cap.
    pub fn request_cap_exceeded(&self) -> bool {
        let state = self.state.lock().expect("cost tracker mutex poisoned");
        state.requests_today >= self.max_requests_per_day
    }

    /// Record a completed request: computes cost from the pricing table,
    /// adds it to both windows, and increments the request counters.
    pub fn record_usage(&self, model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
        let cost = self.pricing.compute_cost(model, input_tokens, output_tokens);
        let mut state = self.state.lock().expect("cost tracker mutex poisoned");
        state.spent_today += cost;
        state.spent_this_month += cost;
        state.requests_today += 1;
        state.total_requests += 1;
        cost
    }

    pub fn status(&self) -> CostStatus {
        let state = self.state.lock().expect("cost tracker mutex poisoned");
        CostStatus {
            daily_budget: self.daily_budget,
            spent_today: state.spent_today,
            monthly_budget: self.monthly_budget,
            spent_this_month: state.spent_this_month,
            requests_today: state.requests_today,
            total_requests: state.total_requests,
            max_requests_per_day: self.max_requests_per_day,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CostStatus {
    pub daily_budget: f64,
    pub spent_today: f64,
    pub monthly_budget: f64,
    pub spent_this_month: f64,
    pub requests_today: u64,
    pub total_requests: u64,
    pub max_requests_per_day: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_usage_and_accumulates_cost() {
        let tracker = CostTracker::new(10.0, 200.0, 100);
        let cost = tracker.record_usage("anthropic/claude-sonnet-4", 1000, 500);
        assert!((cost - 0.0105).abs() < 1e-10);

        let status = tracker.status();
        assert!((status.spent_today - 0.0105).abs() < 1e-10);
        assert!((status.spent_this_month - 0.0105).abs() < 1e-10);
        assert_eq!(status.requests_today, 1);
        assert_eq!(status.total_requests, 1);
    }

    #[test]
    fn budget_exceeded_once_spend_reaches_limit() {
        let tracker = CostTracker::new(0.01, 200.0, 100);
        assert!(!tracker.budget_exceeded());
        tracker.record_usage("anthropic/claude-sonnet-4", 1000, 500);
        assert!(tracker.budget_exceeded());
    }

    #[test]
    fn request_cap_exceeded_once_count_reaches_limit() {
        let tracker = CostTracker::new(10.0, 200.0, 2);
        assert!(!tracker.request_cap_exceeded());
        tracker.record_usage("local", 10, 10);
        tracker.record_usage("local", 10, 10);
        assert!(tracker.request_cap_exceeded());
    }

    #[test]
    fn check_resets_is_a_no_op_within_the_same_day() {
        let tracker = CostTracker::new(10.0, 200.0, 100);
        tracker.record_usage("anthropic/claude-sonnet-4", 1000, 500);
        tracker.check_resets();
        assert!(tracker.status().spent_today > 0.0);
    }

    #[test]
    fn unknown_model_costs_nothing() {
        let tracker = CostTracker::new(10.0, 200.0, 100);
        let cost = tracker.record_usage("local", 1000, 1000);
        assert_eq!(cost, 0.0);
        assert_eq!(tracker.status().requests_today, 1);
    }

    #[test]
    fn status_reports_configured_limits() {
        let tracker = CostTracker::new(5.0, 50.0, 25);
        let status = tracker.status();
        assert_eq!(status.daily_budget, 5.0);
        assert_eq!(status.monthly_budget, 50.0);
        assert_eq!(status.max_requests_per_day, 25);
    }
}
