//! `wizard gateway` — start the HTTP gateway server.

use wizard_config::WizardConfig;

pub async fn run(port_override: Option<u16>, host_override: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = WizardConfig::load().map_err(|e| format!("failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    println!("Wizard Gateway");
    println!("  listening:        {}:{}", config.gateway.host, config.gateway.port);
    println!("  pairing required: {}", config.gateway.require_pairing);
    println!("  cloud enabled:    {}", config.policy.cloud_enabled);
    println!("  default backend:  {}", config.default_backend);

    wizard_gateway::start(config).await?;
    Ok(())
}
