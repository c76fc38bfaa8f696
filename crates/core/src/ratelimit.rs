//! Shared shapes for the rate limiter (§4.3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Light,
    Standard,
    Heavy,
    Expensive,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Light => "light",
            Tier::Standard => "standard",
            Tier::Heavy => "heavy",
            Tier::Expensive => "expensive",
        };
        f.write_str(s)
    }
}

/// `{requests_per_minute, requests_per_hour, requests_per_day, cooldown_seconds}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierLimits {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
    pub requests_per_day: u32,
    pub cooldown_seconds: f64,
}

impl Tier {
    /// The defaults given in §4.3.
    pub fn default_limits(self) -> TierLimits {
        match self {
            Tier::Light => TierLimits {
                requests_per_minute: 120,
                requests_per_hour: 3_600,
                requests_per_day: 50_000,
                cooldown_seconds: 0.1,
            },
            Tier::Standard => TierLimits {
                requests_per_minute: 60,
                requests_per_hour: 1_000,
                requests_per_day: 10_000,
                cooldown_seconds: 0.5,
            },
            Tier::Heavy => TierLimits {
                requests_per_minute: 10,
                requests_per_hour: 100,
                requests_per_day: 500,
                cooldown_seconds: 2.0,
            },
            Tier::Expensive => TierLimits {
                requests_per_minute: 5,
                requests_per_hour: 50,
                requests_per_day: 200,
                cooldown_seconds: 5.0,
            },
        }
    }
}

/// One sliding window (minute, hour, or day) for a single tier.
#[derive(Debug, Clone)]
pub struct Window {
    pub count: u32,
    pub started_at: DateTime<Utc>,
}

impl Window {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { count: 0, started_at: now }
    }
}

/// Per-device, per-tier rate-limit state: three counters with their
/// window-start times, the last-request timestamp, and a blocked-until
/// timestamp.
#[derive(Debug, Clone)]
pub struct TierState {
    pub minute: Window,
    pub hour: Window,
    pub day: Window,
    pub last_request: Option<DateTime<Utc>>,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl TierState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            minute: Window::new(now),
            hour: Window::new(now),
            day: Window::new(now),
            last_request: None,
            blocked_until: None,
        }
    }
}

/// The outcome of a `check()` call, allow or deny with enough context to
/// render both the JSON body and the HTTP headers described in §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub tier: Tier,
    pub retry_after_seconds: Option<f64>,
    pub limit_minute: u32,
    pub remaining_minute: u32,
}
