//! `wizard config` — configuration management commands.

use wizard_config::WizardConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("validating configuration...");

    match WizardConfig::load() {
        Ok(config) => {
            println!("config parsed and validated");
            println!();
            println!("gateway:         {}:{}", config.gateway.host, config.gateway.port);
            println!("default backend: {}", config.default_backend);
            println!("cloud enabled:   {}", config.policy.cloud_enabled);
            println!("backends:        {}", config.backends.len());
            println!("sync providers:  {}", config.sync_providers.len());
        }
        Err(e) => {
            println!("config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = WizardConfig::load().map_err(|e| format!("failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = WizardConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = wizard_config::WizardConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains("config.toml"));
    }
}
