//! `wizard doctor` — diagnose system health.

use wizard_config::WizardConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Wizard doctor — system diagnostics\n");

    let mut issues = 0;

    let config_path = WizardConfig::config_dir().join("config.toml");
    if config_path.exists() {
        match WizardConfig::load() {
            Ok(config) => {
                println!("  [ok] config file valid");

                if config.backends.is_empty() {
                    println!("  [warn] no backends configured — completions have nowhere to route");
                    issues += 1;
                } else {
                    println!("  [ok] {} backend(s) configured", config.backends.len());
                }

                if !config.policy.cloud_enabled && config.backends.values().all(|b| !b.is_local) {
                    println!("  [warn] cloud is disabled but no local backend is configured");
                    issues += 1;
                }
            }
            Err(e) => {
                println!("  [error] config file invalid: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  [error] no config file — run `wizard onboard`");
        issues += 1;
    }

    let vault_root = WizardConfig::vault_root();
    if vault_root.exists() {
        println!("  [ok] vault directory exists");
    } else {
        println!("  [warn] no vault directory — run `wizard onboard`");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("all checks passed");
    } else {
        println!("{issues} issue(s) found, see above");
    }

    Ok(())
}
