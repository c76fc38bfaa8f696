//! End-to-end integration tests exercising the dispatcher and the
//! router contract together, the way a single `wizard dispatch`
//! invocation would chain them for a skill-routed command.

use wizard_config::DispatchConfig;
use wizard_contract::{ContractRequest, evaluate};
use wizard_core::classification::Intent;
use wizard_core::{DispatchStatus, DispatchTarget};

#[test]
fn exact_ucode_command_dispatches_without_touching_the_contract_layer() {
    let config = DispatchConfig::default();
    let envelope = wizard_dispatch::dispatch("STATUS", &config);

    assert_eq!(envelope.status, DispatchStatus::Success);
    assert_eq!(envelope.dispatch_to, Some(DispatchTarget::Ucode));
    assert_eq!(envelope.command.as_deref(), Some("STATUS"));
}

#[test]
fn free_form_text_falls_through_to_a_skill_route_whose_contract_resolves_to_chat() {
    let config = DispatchConfig::default();
    let envelope = wizard_dispatch::dispatch("what does $HOME mean in a bash config?", &config);

    assert_eq!(envelope.dispatch_to, Some(DispatchTarget::Vibe));

    let contract_request = ContractRequest {
        intent: Intent::Docs,
        mode: "conversation",
        privacy: "internal",
        ghost_mode: false,
        offline_required: false,
    };
    let contract = evaluate(&contract_request);
    assert!(contract.online_allowed);
    assert_eq!(contract.model, "mistral-small");
}

#[test]
fn ghost_mode_request_is_forced_local_regardless_of_intent() {
    let contract_request = ContractRequest {
        intent: Intent::Code,
        mode: "code",
        privacy: "internal",
        ghost_mode: true,
        offline_required: false,
    };
    let contract = evaluate(&contract_request);
    assert!(!contract.online_allowed);
    assert_eq!(contract.reason, "ghost_mode");
}

#[test]
fn empty_input_is_rejected_before_any_stage_runs() {
    let config = DispatchConfig::default();
    let envelope = wizard_dispatch::dispatch("   ", &config);
    assert_eq!(envelope.status, DispatchStatus::Error);
    assert!(envelope.stage.is_none());
}
