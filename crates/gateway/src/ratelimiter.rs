//! The per-device, per-tier rate limiter engine (§4.3).
//!
//! `wizard_core::ratelimit` owns the shared shapes (`Tier`, `TierLimits`,
//! `Window`, `TierState`, `RateLimitDecision`); this module owns the live
//! state and the check/record/block/unblock behavior across four tiers
//! with minute/hour/day windows and cooldowns.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use wizard_core::ratelimit::{RateLimitDecision, Tier, TierLimits, TierState, Window};

const MINUTE_SECS: i64 = 60;
const HOUR_SECS: i64 = 3_600;
const DAY_SECS: i64 = 86_400;

/// Resolves an HTTP path to a rate-limit tier: exact match first, then the
/// longest matching prefix pattern, else `Standard`.
pub struct EndpointMap {
    exact: HashMap<String, Tier>,
    patterns: Vec<(String, Tier)>,
}

impl EndpointMap {
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            patterns: Vec::new(),
        }
    }

    /// The endpoint-to-tier mapping for the §6 HTTP surface.
    pub fn with_defaults() -> Self {
        let mut map = Self::new();
        map.insert_exact("/health", Tier::Light);
        map.insert_exact("/api/status", Tier::Light);
        map.insert_exact("/api/rate-limits", Tier::Light);
        map.insert_exact("/api/ai/complete", Tier::Standard);
        map.insert_pattern("/api/sync/", Tier::Heavy);
        map
    }

    pub fn insert_exact(&mut self, path: impl Into<String>, tier: Tier) {
        self.exact.insert(path.into(), tier);
    }

    pub fn insert_pattern(&mut self, prefix: impl Into<String>, tier: Tier) {
        self.patterns.push((prefix.into(), tier));
    }

    /// Exact match wins; otherwise the longest matching prefix pattern.
    pub fn resolve(&self, path: &str) -> Tier {
        if let Some(tier) = self.exact.get(path) {
            return *tier;
        }
        self.patterns
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::Standard)
    }
}

impl Default for EndpointMap {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[derive(Default)]
struct DeviceState {
    tiers: HashMap<Tier, TierState>,
}

/// Global admission-control statistics (§4.3 admin operations).
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub active_devices: usize,
    pub requests_last_minute: u64,
    pub requests_last_hour: u64,
    pub blocked_now: usize,
    pub tier_breakdown: HashMap<String, u64>,
}

pub struct RateLimiter {
    endpoints: EndpointMap,
    overrides: HashMap<Tier, TierLimits>,
    devices: Mutex<HashMap<String, DeviceState>>,
}

impl RateLimiter {
    pub fn new(endpoints: EndpointMap, overrides: HashMap<Tier, TierLimits>) -> Self {
        Self {
            endpoints,
            overrides,
            devices: Mutex::new(HashMap::new()),
        }
    }

    fn limits_for(&self, tier: Tier) -> TierLimits {
        self.overrides.get(&tier).copied().unwrap_or_else(|| tier.default_limits())
    }

    pub fn tier_for_path(&self, path: &str) -> Tier {
        self.endpoints.resolve(path)
    }

    /// Admission check for `device_id` against the tier resolved from
    /// `path`. Does not mutate counters — call [`RateLimiter::record`]
    /// once the downstream call actually runs.
    pub fn check(&self, device_id: &str, path: &str) -> RateLimitDecision {
        let tier = self.endpoints.resolve(path);
        let limits = self.limits_for(tier);
        let now = Utc::now();

        let mut devices = self.devices.lock().expect("rate limiter mutex poisoned");
        let state = devices
            .entry(device_id.to_string())
            .or_default()
            .tiers
            .entry(tier)
            .or_insert_with(|| TierState::new(now));

        expire_windows(state, now);

        if let Some(blocked_until) = state.blocked_until {
            if blocked_until > now {
                return deny(tier, limits, (blocked_until - now).num_milliseconds() as f64 / 1000.0);
            }
            state.blocked_until = None;
        }

        if let Some(last) = state.last_request {
            let since = (now - last).num_milliseconds() as f64 / 1000.0;
            if since < limits.cooldown_seconds {
                return deny(tier, limits, limits.cooldown_seconds - since);
            }
        }

        if state.minute.count >= limits.requests_per_minute {
            return deny(tier, limits, retry_after(state.minute.started_at, MINUTE_SECS, now));
        }
        if state.hour.count >= limits.requests_per_hour {
            return deny(tier, limits, retry_after(state.hour.started_at, HOUR_SECS, now));
        }
        if state.day.count >= limits.requests_per_day {
            return deny(tier, limits, retry_after(state.day.started_at, DAY_SECS, now));
        }

        RateLimitDecision {
            allowed: true,
            tier,
            retry_after_seconds: None,
            limit_minute: limits.requests_per_minute,
            remaining_minute: limits.requests_per_minute.saturating_sub(state.minute.count),
        }
    }

    /// Record a completed (allowed) request. Called after the downstream
    /// handler returns, never on a denied check.
    pub fn record(&self, device_id: &str, tier: Tier) {
        let now = Utc::now();
        let mut devices = self.devices.lock().expect("rate limiter mutex poisoned");
        let state = devices
            .entry(device_id.to_string())
            .or_default()
            .tiers
            .entry(tier)
            .or_insert_with(|| TierState::new(now));

        expire_windows(state, now);
        state.minute.count += 1;
        state.hour.count += 1;
        state.day.count += 1;
        state.last_request = Some(now);
    }

    pub fn block_device(&self, device_id: &str, tier: Tier, duration: Duration) {
        let now = Utc::now();
        let mut devices = self.devices.lock().expect("rate limiter mutex poisoned");
        let state = devices
            .entry(device_id.to_string())
            .or_default()
            .tiers
            .entry(tier)
            .or_insert_with(|| TierState::new(now));
        state.blocked_until = Some(now + duration);
    }

    /// Unblock one tier for a device, or every tier if `tier` is `None`.
    pub fn unblock_device(&self, device_id: &str, tier: Option<Tier>) {
        let mut devices = self.devices.lock().expect("rate limiter mutex poisoned");
        let Some(device) = devices.get_mut(device_id) else {
            return;
        };
        match tier {
            Some(t) => {
                if let Some(state) = device.tiers.get_mut(&t) {
                    state.blocked_until = None;
                }
            }
            None => {
                for state in device.tiers.values_mut() {
                    state.blocked_until = None;
                }
            }
        }
    }

    pub fn stats(&self) -> GlobalStats {
        let now = Utc::now();
        let devices = self.devices.lock().expect("rate limiter mutex poisoned");

        let mut requests_last_minute = 0u64;
        let mut requests_last_hour = 0u64;
        let mut blocked_now = 0usize;
        let mut tier_breakdown: HashMap<String, u64> = HashMap::new();

        for device in devices.values() {
            let mut device_blocked = false;
            for (tier, state) in &device.tiers {
                if (now - state.minute.started_at).num_seconds() <= MINUTE_SECS {
                    requests_last_minute += state.minute.count as u64;
                }
                if (now - state.hour.started_at).num_seconds() <= HOUR_SECS {
                    requests_last_hour += state.hour.count as u64;
                }
                if state.blocked_until.is_some_and(|b| b > now) {
                    device_blocked = true;
                }
                *tier_breakdown.entry(tier.to_string()).or_default() += state.day.count as u64;
            }
            if device_blocked {
                blocked_now += 1;
            }
        }

        GlobalStats {
            active_devices: devices.len(),
            requests_last_minute,
            requests_last_hour,
            blocked_now,
            tier_breakdown,
        }
    }

    /// Per-device snapshot for `GET /api/rate-limits` (§6).
    pub fn device_snapshot(&self, device_id: &str) -> HashMap<String, RateLimitDecision> {
        let now = Utc::now();
        let devices = self.devices.lock().expect("rate limiter mutex poisoned");
        let Some(device) = devices.get(device_id) else {
            return HashMap::new();
        };
        device
            .tiers
            .iter()
            .map(|(tier, state)| {
                let limits = self.limits_for(*tier);
                let blocked = state.blocked_until.is_some_and(|b| b > now);
                (
                    tier.to_string(),
                    RateLimitDecision {
                        allowed: !blocked,
                        tier: *tier,
                        retry_after_seconds: None,
                        limit_minute: limits.requests_per_minute,
                        remaining_minute: limits.requests_per_minute.saturating_sub(state.minute.count),
                    },
                )
            })
            .collect()
    }
}

fn expire_windows(state: &mut TierState, now: DateTime<Utc>) {
    if (now - state.minute.started_at).num_seconds() > MINUTE_SECS {
        state.minute = Window::new(now);
    }
    if (now - state.hour.started_at).num_seconds() > HOUR_SECS {
        state.hour = Window::new(now);
    }
    if (now - state.day.started_at).num_seconds() > DAY_SECS {
        state.day = Window::new(now);
    }
}

fn retry_after(window_started_at: DateTime<Utc>, window_secs: i64, now: DateTime<Utc>) -> f64 {
    let elapsed = (now - window_started_at).num_milliseconds() as f64 / 1000.0;
    (window_secs as f64 - elapsed).max(0.0)
}

fn deny(tier: Tier, limits: TierLimits, retry_after_seconds: f64) -> RateLimitDecision {
    RateLimitDecision {
        allowed: false,
        tier,
        retry_after_seconds: Some(retry_after_seconds),
        limit_minute: limits.requests_per_minute,
        remaining_minute: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(EndpointMap::with_defaults(), HashMap::new())
    }

    #[test]
    fn endpoint_map_resolves_exact_and_pattern() {
        let map = EndpointMap::with_defaults();
        assert_eq!(map.resolve("/health"), Tier::Light);
        assert_eq!(map.resolve("/api/sync/gmail"), Tier::Heavy);
        assert_eq!(map.resolve("/unmapped"), Tier::Standard);
    }

    #[test]
    fn first_check_for_a_device_is_allowed() {
        let limiter = limiter();
        let decision = limiter.check("dev-1", "/api/ai/complete");
        assert!(decision.allowed);
        assert_eq!(decision.tier, Tier::Standard);
    }

    #[test]
    fn cooldown_denies_an_immediate_second_check_after_record() {
        let limiter = limiter();
        limiter.check("dev-1", "/api/ai/complete");
        limiter.record("dev-1", Tier::Standard);
        let decision = limiter.check("dev-1", "/api/ai/complete");
        assert!(!decision.allowed);
        assert!(decision.retry_after_seconds.unwrap() > 0.0);
    }

    #[test]
    fn minute_limit_denies_after_exhausting_the_window() {
        let mut overrides = HashMap::new();
        overrides.insert(
            Tier::Light,
            TierLimits {
                requests_per_minute: 2,
                requests_per_hour: 100,
                requests_per_day: 1000,
                cooldown_seconds: 0.0,
            },
        );
        let limiter = RateLimiter::new(EndpointMap::with_defaults(), overrides);
        for _ in 0..2 {
            assert!(limiter.check("dev-1", "/health").allowed);
            limiter.record("dev-1", Tier::Light);
        }
        let decision = limiter.check("dev-1", "/health");
        assert!(!decision.allowed);
        assert_eq!(decision.tier, Tier::Light);
    }

    #[test]
    fn blocked_device_is_denied_until_unblocked() {
        let limiter = limiter();
        limiter.block_device("dev-1", Tier::Standard, Duration::seconds(60));
        assert!(!limiter.check("dev-1", "/api/ai/complete").allowed);
        limiter.unblock_device("dev-1", Some(Tier::Standard));
        assert!(limiter.check("dev-1", "/api/ai/complete").allowed);
    }

    #[test]
    fn stats_report_active_devices() {
        let limiter = limiter();
        limiter.check("dev-1", "/health");
        limiter.record("dev-1", Tier::Light);
        let stats = limiter.stats();
        assert_eq!(stats.active_devices, 1);
        assert_eq!(stats.requests_last_minute, 1);
    }
}
