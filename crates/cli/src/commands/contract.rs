//! `wizard contract test` — evaluate the router contract (§4.2 step 5)
//! for a hypothetical request, without running the full completion
//! pipeline.

use wizard_contract::ContractRequest;
use wizard_core::classification::Intent;

fn parse_intent(s: &str) -> Intent {
    match s.to_lowercase().as_str() {
        "test" => Intent::Test,
        "docs" => Intent::Docs,
        "design" => Intent::Design,
        "ops" => Intent::Ops,
        _ => Intent::Code,
    }
}

pub fn test(
    intent: &str,
    mode: &str,
    privacy: &str,
    ghost_mode: bool,
    offline_required: bool,
    force_cloud: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ContractRequest {
        intent: parse_intent(intent),
        mode,
        privacy,
        ghost_mode,
        offline_required,
    };

    match wizard_contract::enforce(&request, force_cloud) {
        Ok(contract) => {
            println!("intent:         {:?}", contract.intent);
            println!("model:          {}", contract.model);
            println!("provider:       {}", contract.provider);
            println!("online_allowed: {}", contract.online_allowed);
            println!("reason:         {}", contract.reason);
        }
        Err(e) => {
            println!("contract denied: {e}");
        }
    }

    Ok(())
}
