//! Backend router — resolves a named backend ("local", "openrouter", ...)
//! to a live [`Backend`] implementation, built once from [`WizardConfig`].

use std::collections::HashMap;
use std::sync::Arc;
use wizard_config::WizardConfig;
use wizard_core::Backend;

use crate::cloud::CloudBackend;
use crate::local::LocalBackend;

/// Routes completion requests to the correct backend by name.
pub struct BackendRouter {
    backends: HashMap<String, Arc<dyn Backend>>,
    default_backend: String,
}

impl BackendRouter {
    pub fn new(default_backend: impl Into<String>) -> Self {
        Self {
            backends: HashMap::new(),
            default_backend: default_backend.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, backend: Arc<dyn Backend>) {
        self.backends.insert(name.into(), backend);
    }

    pub fn default_backend(&self) -> Option<Arc<dyn Backend>> {
        self.backends.get(&self.default_backend).cloned()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(name).cloned()
    }

    /// The first backend whose `is_local()` is true, if any is registered.
    pub fn any_local(&self) -> Option<Arc<dyn Backend>> {
        self.backends.values().find(|b| b.is_local()).cloned()
    }

    /// The first backend whose `is_local()` is false, if any is registered.
    pub fn any_cloud(&self) -> Option<Arc<dyn Backend>> {
        self.backends.values().find(|b| !b.is_local()).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.backends.keys().map(|s| s.as_str()).collect()
    }
}

fn default_base_url(name: &str) -> String {
    match name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "anthropic" => "https://api.anthropic.com/v1".into(),
        "ollama" => "http://127.0.0.1:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        _ => format!("https://{name}.api.example.com/v1"),
    }
}

/// Build a router from configuration: one backend per `[backends.*]`
/// table entry, local ones routed to `LocalBackend`, everything else to
/// `CloudBackend`.
pub fn build_from_config(config: &WizardConfig) -> BackendRouter {
    let mut router = BackendRouter::new(&config.default_backend);

    for (name, backend_config) in &config.backends {
        let backend: Arc<dyn Backend> = if backend_config.is_local {
            let base_url = backend_config
                .api_url
                .clone()
                .unwrap_or_else(|| "http://127.0.0.1:11434/v1".into());
            Arc::new(LocalBackend::new(base_url, backend_config.timeout_ms))
        } else {
            let base_url = backend_config
                .api_url
                .clone()
                .unwrap_or_else(|| default_base_url(name));
            Arc::new(CloudBackend::new(
                name.clone(),
                base_url,
                backend_config.api_key.clone().unwrap_or_default(),
                backend_config.timeout_ms,
            ))
        };
        router.register(name.clone(), backend);
    }

    if router.get(&config.default_backend).is_none() && config.default_backend == "local" {
        router.register("local", Arc::new(LocalBackend::localhost(11434, 30_000)));
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut router = BackendRouter::new("local");
        router.register("local", Arc::new(LocalBackend::localhost(11434, 30_000)));
        assert!(router.get("local").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default_backend().is_some());
    }

    #[test]
    fn build_from_default_config_has_a_local_backend() {
        let config = WizardConfig::default();
        let router = build_from_config(&config);
        assert!(router.default_backend().is_some());
        assert!(router.any_local().is_some());
    }

    #[test]
    fn default_base_urls_are_well_known() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("ollama").contains("127.0.0.1"));
    }
}
