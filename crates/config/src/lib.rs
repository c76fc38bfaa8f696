//! Configuration loading, validation, and management for the Wizard gateway.
//!
//! Loads configuration from `~/.wizard/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.wizard/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Gateway HTTP surface (§6).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Device pairing / trust settings.
    #[serde(default)]
    pub devices: DeviceAuthConfig,

    /// Per-tier rate limit overrides (§4.3). Unset tiers use the built-in
    /// defaults from `wizard_core::Tier::default_limits`.
    #[serde(default)]
    pub rate_limits: HashMap<String, RateLimitOverride>,

    /// Cost tracker budgets (§3 Cost Tracker, §4.4 budget rule).
    #[serde(default)]
    pub budgets: BudgetsConfig,

    /// Command dispatcher settings (§4.1), mirroring the source's
    /// dispatch config dataclass.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Completion backend configurations, keyed by backend name
    /// ("local", "openrouter", "anthropic", ...).
    #[serde(default)]
    pub backends: HashMap<String, BackendConfig>,

    /// Default backend to route to when the classifier doesn't escalate.
    #[serde(default = "default_local_backend")]
    pub default_backend: String,

    /// External sync provider credentials (§4.6), keyed by provider name.
    #[serde(default)]
    pub sync_providers: HashMap<String, SyncProviderConfig>,

    /// Policy enforcer settings (§4.4).
    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_local_backend() -> String {
    "local".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for WizardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardConfig")
            .field("gateway", &self.gateway)
            .field("devices", &self.devices)
            .field("rate_limits", &self.rate_limits)
            .field("budgets", &self.budgets)
            .field("dispatch", &self.dispatch)
            .field("backends", &self.backends)
            .field("default_backend", &self.default_backend)
            .field("sync_providers", &self.sync_providers)
            .field("policy", &self.policy)
            .finish()
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("is_local", &self.is_local)
            .field("daily_quota", &self.daily_quota)
            .finish()
    }
}

impl std::fmt::Debug for SyncProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncProviderConfig")
            .field("enabled", &self.enabled)
            .field("client_id", &redact(&self.client_id))
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("settings", &self.settings)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_true")]
    pub require_pairing: bool,

    #[serde(default)]
    pub allow_public_bind: bool,

    /// Cap on concurrent in-flight completion requests (§5).
    #[serde(default = "default_max_concurrent_completions")]
    pub max_concurrent_completions: usize,
}

fn default_port() -> u16 {
    42617
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_true() -> bool {
    true
}
fn default_max_concurrent_completions() -> usize {
    8
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            require_pairing: true,
            allow_public_bind: false,
            max_concurrent_completions: default_max_concurrent_completions(),
        }
    }
}

/// Device pairing / trust settings (§3 Device, Pairing Request).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceAuthConfig {
    /// QR pairing code time-to-live, in seconds.
    #[serde(default = "default_pairing_ttl_seconds")]
    pub pairing_ttl_seconds: i64,

    /// Devices that start at `TrustLevel::Admin` instead of `Pending`.
    #[serde(default)]
    pub preauthorized_device_ids: Vec<String>,
}

fn default_pairing_ttl_seconds() -> i64 {
    300
}

impl Default for DeviceAuthConfig {
    fn default() -> Self {
        Self {
            pairing_ttl_seconds: default_pairing_ttl_seconds(),
            preauthorized_device_ids: vec![],
        }
    }
}

/// Per-tier rate limit override (§4.3). Any field left unset keeps the
/// built-in default for that field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RateLimitOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<f64>,
}

/// Cost tracker budgets (§3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum cloud spend in USD per calendar day. `None` = unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_usd: Option<f64>,

    /// Maximum cloud spend in USD per calendar month. `None` = unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_usd: Option<f64>,

    /// Custom per-million-token pricing overrides, keyed by model name.
    #[serde(default)]
    pub custom_pricing: HashMap<String, PricingOverrideConfig>,
}

impl Default for BudgetsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_usd: Some(5.0),
            monthly_usd: Some(100.0),
            custom_pricing: HashMap::new(),
        }
    }
}

/// Custom per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingOverrideConfig {
    pub input_per_m: f64,
    pub output_per_m: f64,
}

/// Command dispatcher settings, mirroring the source's dispatch config
/// dataclass: a shell blocklist, an optional strict allowlist, and a
/// read-only sub-allowlist that determines whether a shell command needs
/// confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_true")]
    pub shell_enabled: bool,

    #[serde(default = "default_shell_blocklist")]
    pub shell_blocklist: Vec<String>,

    /// If non-empty, shell tokens outside this list are rejected outright.
    #[serde(default)]
    pub shell_allowlist: Vec<String>,

    #[serde(default = "default_shell_read_only_allowlist")]
    pub shell_read_only_allowlist: Vec<String>,

    /// Maximum Levenshtein distance accepted during fuzzy command matching.
    #[serde(default = "default_fuzzy_max_distance")]
    pub fuzzy_max_distance: usize,
}

fn default_shell_blocklist() -> Vec<String> {
    [
        "nc", "ncat", "netcat", "sudo", "su", "rm", "dd", "mkfs", "scp", "tar", "chmod", "chown",
        "shutdown", "reboot", "kill", "killall", "passwd", "curl", "wget",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_shell_read_only_allowlist() -> Vec<String> {
    [
        "ls", "cat", "grep", "find", "head", "tail", "wc", "pwd", "echo", "which", "file", "stat",
        "du", "df", "ps", "env",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_fuzzy_max_distance() -> usize {
    2
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            shell_enabled: true,
            shell_blocklist: default_shell_blocklist(),
            shell_allowlist: vec![],
            shell_read_only_allowlist: default_shell_read_only_allowlist(),
            fuzzy_max_distance: default_fuzzy_max_distance(),
        }
    }
}

/// Configuration for a single completion backend (§4.2 step 9).
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(default)]
    pub is_local: bool,

    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,

    /// Cap on completions this provider may serve per day (§4.2 step 8).
    /// `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_quota: Option<u64>,
}

fn default_backend_timeout_ms() -> u64 {
    30_000
}

/// External sync provider credentials and settings (§4.6).
#[derive(Clone, Serialize, Deserialize)]
pub struct SyncProviderConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,

    /// Provider-specific settings that don't warrant their own field
    /// (e.g. a Jira `base_url`, a Slack `workspace_id`).
    #[serde(flatten)]
    pub settings: HashMap<String, serde_json::Value>,
}

/// Policy enforcer settings (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Whether cloud backends may be used at all. When false, every
    /// classification is forced onto a local backend regardless of privacy.
    #[serde(default = "default_true")]
    pub cloud_enabled: bool,

    /// Maximum number of policy violations retained in the in-memory log.
    #[serde(default = "default_violation_log_capacity")]
    pub violation_log_capacity: usize,

    /// Additional secret-detection regex patterns, appended to the
    /// built-in family (API keys, AWS keys, private-key markers, ...).
    #[serde(default)]
    pub extra_secret_patterns: Vec<String>,
}

fn default_violation_log_capacity() -> usize {
    500
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            cloud_enabled: true,
            violation_log_capacity: default_violation_log_capacity(),
            extra_secret_patterns: vec![],
        }
    }
}

impl WizardConfig {
    /// Load configuration from the default path (`~/.wizard/config.toml`),
    /// applying environment variable overrides documented in §6.
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = Self::config_dir();
        let config_path = config_dir.join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if std::env::var("WIZARD_LOCAL_ONLY").is_ok() {
            config.gateway.host = "127.0.0.1".into();
            config.gateway.allow_public_bind = false;
        }

        if let Ok(key) = std::env::var("WIZARD_KEY") {
            config
                .backends
                .entry("local".into())
                .or_insert_with(|| BackendConfig {
                    api_key: None,
                    api_url: None,
                    default_model: None,
                    is_local: true,
                    timeout_ms: default_backend_timeout_ms(),
                    daily_quota: None,
                })
                .api_key
                .get_or_insert(key);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("no config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// The configuration directory, `~/.wizard`.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wizard")
    }

    /// The binder/vault root, `$VAULT_ROOT` if set, else `~/.wizard/vault`.
    pub fn vault_root() -> PathBuf {
        std::env::var("VAULT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("vault"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(daily) = self.budgets.daily_usd {
            if daily < 0.0 {
                return Err(ConfigError::ValidationError("budgets.daily_usd must be >= 0".into()));
            }
        }
        if let Some(monthly) = self.budgets.monthly_usd {
            if monthly < 0.0 {
                return Err(ConfigError::ValidationError("budgets.monthly_usd must be >= 0".into()));
            }
        }
        if self.gateway.max_concurrent_completions == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_concurrent_completions must be >= 1".into(),
            ));
        }
        for (name, limit) in &self.rate_limits {
            if limit.requests_per_minute == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "rate_limits.{name}.requests_per_minute must be >= 1"
                )));
            }
        }
        Ok(())
    }

    /// Generate a default config TOML string (for the `onboard`/`setup` flow).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            devices: DeviceAuthConfig::default(),
            rate_limits: HashMap::new(),
            budgets: BudgetsConfig::default(),
            dispatch: DispatchConfig::default(),
            backends: HashMap::new(),
            default_backend: default_local_backend(),
            sync_providers: HashMap::new(),
            policy: PolicyConfig::default(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WizardConfig::default();
        assert_eq!(config.gateway.port, 42617);
        assert!(config.gateway.require_pairing);
        assert!(config.dispatch.shell_blocklist.contains(&"rm".to_string()));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = WizardConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: WizardConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.dispatch.shell_blocklist, config.dispatch.shell_blocklist);
    }

    #[test]
    fn invalid_daily_budget_rejected() {
        let mut config = WizardConfig::default();
        config.budgets.daily_usd = Some(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = WizardConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 42617);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = WizardConfig::default_toml();
        assert!(toml_str.contains("42617"));
    }

    #[test]
    fn read_only_shell_commands_do_not_overlap_blocklist() {
        let config = WizardConfig::default();
        for cmd in &config.dispatch.shell_read_only_allowlist {
            assert!(
                !config.dispatch.shell_blocklist.contains(cmd),
                "{cmd} is both read-only and blocked"
            );
        }
    }

    #[test]
    fn zero_concurrency_cap_rejected() {
        let mut config = WizardConfig::default();
        config.gateway.max_concurrent_completions = 0;
        assert!(config.validate().is_err());
    }
}
