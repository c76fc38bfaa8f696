//! `wizard onboard` — first-time setup.

use wizard_config::WizardConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = WizardConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let vault_root = WizardConfig::vault_root();

    println!("Wizard — first-time setup");
    println!("==========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("created config directory: {}", config_dir.display());
    } else {
        println!("config directory exists: {}", config_dir.display());
    }

    if !vault_root.exists() {
        std::fs::create_dir_all(&vault_root)?;
        println!("created vault directory: {}", vault_root.display());
    }

    if config_path.exists() {
        println!("\nconfig already exists at: {}", config_path.display());
        println!("edit it directly or delete and re-run onboard.");
    } else {
        let default_toml = WizardConfig::default_toml();
        std::fs::write(&config_path, &default_toml)?;
        println!("created config.toml at: {}", config_path.display());
        println!("\nnext steps:");
        println!("  1. edit {} to add backend API keys", config_path.display());
        println!("  2. run `wizard gateway` to start the edge server");
        println!("  3. run `wizard devices pair <code>` once a device shows a pairing code");
    }

    println!("\nsetup complete.");
    Ok(())
}
