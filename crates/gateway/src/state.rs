//! Shared gateway state — built once from [`WizardConfig`] at startup and
//! wrapped in an `Arc` so every handler and middleware layer borrows the
//! same subsystems.

use std::collections::HashMap;
use std::sync::Arc;

use wizard_config::WizardConfig;
use wizard_core::ratelimit::{Tier, TierLimits};
use wizard_policy::PolicyEnforcer;
use wizard_providers::BackendRouter;
use wizard_telemetry::{CostTracker, pricing::ModelPricing};

use crate::devices::DeviceRegistry;
use crate::failures::FailureTracker;
use crate::quota::QuotaTracker;
use crate::ratelimiter::{EndpointMap, RateLimiter};

pub type SharedGatewayState = Arc<GatewayState>;

pub struct GatewayState {
    pub config: WizardConfig,
    pub devices: DeviceRegistry,
    pub rate_limiter: RateLimiter,
    pub policy: PolicyEnforcer,
    pub cost_tracker: CostTracker,
    pub quota: QuotaTracker,
    pub backend_router: BackendRouter,
    pub failures: FailureTracker,
}

impl GatewayState {
    pub fn new(config: WizardConfig) -> Self {
        let devices = DeviceRegistry::new(config.devices.pairing_ttl_seconds, config.devices.preauthorized_device_ids.clone());

        let rate_limiter = RateLimiter::new(EndpointMap::with_defaults(), build_tier_overrides(&config));

        let policy = PolicyEnforcer::new(
            config.policy.cloud_enabled,
            config.budgets.daily_usd.unwrap_or(f64::MAX),
            config.budgets.monthly_usd.unwrap_or(f64::MAX),
            config.policy.violation_log_capacity,
        );

        let mut pricing = wizard_telemetry::pricing::PricingTable::with_defaults();
        for (model, override_pricing) in &config.budgets.custom_pricing {
            pricing.set(model.clone(), ModelPricing::new(override_pricing.input_per_m, override_pricing.output_per_m));
        }
        let cost_tracker = if config.budgets.enabled {
            CostTracker::with_pricing(
                config.budgets.daily_usd.unwrap_or(f64::MAX),
                config.budgets.monthly_usd.unwrap_or(f64::MAX),
                u64::MAX,
                pricing,
            )
        } else {
            CostTracker::with_pricing(f64::MAX, f64::MAX, u64::MAX, pricing)
        };

        let quota = QuotaTracker::new(build_daily_quotas(&config));
        let backend_router = wizard_providers::router::build_from_config(&config);
        let failures = FailureTracker::new();

        Self {
            config,
            devices,
            rate_limiter,
            policy,
            cost_tracker,
            quota,
            backend_router,
            failures,
        }
    }
}

fn build_tier_overrides(config: &WizardConfig) -> HashMap<Tier, TierLimits> {
    let mut overrides = HashMap::new();
    for (tier_name, override_cfg) in &config.rate_limits {
        let Some(tier) = parse_tier(tier_name) else {
            continue;
        };
        let mut limits = tier.default_limits();
        if let Some(v) = override_cfg.requests_per_minute {
            limits.requests_per_minute = v;
        }
        if let Some(v) = override_cfg.requests_per_hour {
            limits.requests_per_hour = v;
        }
        if let Some(v) = override_cfg.requests_per_day {
            limits.requests_per_day = v;
        }
        if let Some(v) = override_cfg.cooldown_seconds {
            limits.cooldown_seconds = v;
        }
        overrides.insert(tier, limits);
    }
    overrides
}

fn parse_tier(name: &str) -> Option<Tier> {
    match name.to_lowercase().as_str() {
        "light" => Some(Tier::Light),
        "standard" => Some(Tier::Standard),
        "heavy" => Some(Tier::Heavy),
        "expensive" => Some(Tier::Expensive),
        _ => None,
    }
}

fn build_daily_quotas(config: &WizardConfig) -> HashMap<String, u64> {
    config
        .backends
        .iter()
        .filter_map(|(name, backend)| backend.daily_quota.map(|cap| (name.clone(), cap)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_builds_from_default_config() {
        let config = WizardConfig::default();
        let state = GatewayState::new(config);
        assert!(state.devices.is_empty());
    }
}
