//! `wizard usage` — pricing table and configured budgets.

use wizard_config::WizardConfig;
use wizard_telemetry::pricing::PricingTable;

/// List available model pricing.
pub fn pricing() {
    let table = PricingTable::with_defaults();
    let models = table.models();

    println!("Model pricing (per 1M tokens)");
    println!("─────────────────────────────────────────────────────");
    println!("{:<40} {:>10} {:>10}", "Model", "Input", "Output");

    for name in &models {
        if let Some(p) = table.get(name) {
            println!("{:<40} ${:>8.3} ${:>8.3}", name, p.input_per_m, p.output_per_m);
        }
    }

    println!();
    println!("{} models with pricing data", models.len());
}

/// Show configured budgets.
pub async fn budgets() -> Result<(), Box<dyn std::error::Error>> {
    let config = WizardConfig::load().map_err(|e| format!("failed to load config: {e}"))?;
    let budgets = &config.budgets;

    println!("budgets enabled: {}", budgets.enabled);
    match budgets.daily_usd {
        Some(v) => println!("daily cap:   ${v:.2}"),
        None => println!("daily cap:   unlimited"),
    }
    match budgets.monthly_usd {
        Some(v) => println!("monthly cap: ${v:.2}"),
        None => println!("monthly cap: unlimited"),
    }

    if !budgets.custom_pricing.is_empty() {
        println!("\ncustom pricing overrides:");
        for (model, p) in &budgets.custom_pricing {
            println!("  {model}: ${:.3}/${:.3} per 1M tokens", p.input_per_m, p.output_per_m);
        }
    }

    Ok(())
}

/// Estimate cost for a given model and token counts.
pub fn estimate(model: &str, input_tokens: u32, output_tokens: u32) {
    let table = PricingTable::with_defaults();
    let cost = table.compute_cost(model, input_tokens, output_tokens);

    if cost == 0.0 {
        println!("model '{model}' not found in pricing table");
        println!("use `wizard usage pricing` to see available models");
    } else {
        println!("cost estimate for {model}");
        println!("  input tokens:  {input_tokens}");
        println!("  output tokens: {output_tokens}");
        println!("  estimated cost: ${cost:.6}");
    }
}
