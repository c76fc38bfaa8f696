//! `wizard providers` — list configured completion backends.

use wizard_config::WizardConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = WizardConfig::load().map_err(|e| format!("failed to load config: {e}"))?;

    if config.backends.is_empty() {
        println!("no backends configured.");
        println!();
        println!("add one in config.toml:");
        println!("  [backends.local]");
        println!("  is_local = true");
        println!("  api_url = \"http://127.0.0.1:11434/v1\"");
        return Ok(());
    }

    println!("configured backends ({} total, default: {})", config.backends.len(), config.default_backend);
    println!("─────────────────────────────────────────────────────");
    for (name, backend) in &config.backends {
        let kind = if backend.is_local { "local" } else { "cloud" };
        println!(
            "  {name:<16} {kind:<6} model: {:<30} url: {}",
            backend.default_model.as_deref().unwrap_or("(default)"),
            backend.api_url.as_deref().unwrap_or("(default)"),
        );
        if let Some(quota) = backend.daily_quota {
            println!("                         daily quota: {quota} requests");
        }
    }

    Ok(())
}
