//! `wizard dispatch` — run the three-stage command dispatcher once,
//! locally, against the configured dispatch settings (§4.1).

use wizard_config::WizardConfig;
use wizard_core::DispatchTarget;

pub async fn run(input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = WizardConfig::load().map_err(|e| format!("failed to load config: {e}"))?;
    let envelope = wizard_dispatch::dispatch(input, &config.dispatch);

    println!("status:   {:?}", envelope.status);
    if let Some(stage) = envelope.stage {
        println!("stage:    {stage}");
    }
    match envelope.dispatch_to {
        Some(DispatchTarget::Ucode) => println!("route:    ucode → {}", envelope.command.as_deref().unwrap_or("?")),
        Some(DispatchTarget::Shell) => {
            println!("route:    shell");
            if let Some(shell) = &envelope.shell {
                println!("  command: {}", shell.command);
                println!("  args:    {:?}", shell.args);
                println!("  reason:  {}", shell.validation_reason);
                if shell.requires_confirmation {
                    println!("  requires confirmation: {}", shell.confirmation_reason.as_deref().unwrap_or(""));
                }
            }
        }
        Some(DispatchTarget::Vibe) => println!("route:    skill → {}", envelope.skill.as_deref().unwrap_or("?")),
        Some(DispatchTarget::Confirm) => println!("route:    confirm"),
        None => {}
    }
    if let Some(confidence) = envelope.confidence {
        println!("confidence: {confidence:.3}");
    }
    if !envelope.message.is_empty() {
        println!("message:  {}", envelope.message);
    }
    if envelope.debug.enabled {
        println!("\nroute trace:");
        for entry in &envelope.debug.route_trace {
            println!("  [stage {}] {} {:?}", entry.stage, entry.decision, entry.detail);
        }
    }

    Ok(())
}
