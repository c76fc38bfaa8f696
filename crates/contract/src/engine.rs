//! Router contract evaluation (§4.2 step 5) — the VIBE-ROUTER-CONTRACT
//! rules that pick a model for the classified intent and decide whether
//! cloud routing is reachable at all for this request.

use wizard_core::classification::Intent;

use crate::ContractError;
use crate::model::{ContractIntent, RouterContract};

/// Inputs the contract needs, already lifted out of the request and its
/// classification so this module has no dependency on the gateway crate.
pub struct ContractRequest<'a> {
    pub intent: Intent,
    pub mode: &'a str,
    pub privacy: &'a str,
    pub ghost_mode: bool,
    pub offline_required: bool,
}

/// Evaluate the router contract for one request.
pub fn evaluate(request: &ContractRequest<'_>) -> RouterContract {
    let contract_intent = ContractIntent::from_classification_intent(request.intent);
    let model = contract_intent.default_model().to_string();
    let privacy = request.privacy.to_lowercase();

    let (online_allowed, provider, reason) = if request.ghost_mode {
        (false, "local", "ghost_mode")
    } else if privacy == "private" || request.offline_required {
        (false, "local", "offline_required_or_private")
    } else {
        (true, "wizard", "policy_allows_online")
    };

    RouterContract {
        intent: contract_intent,
        mode: if request.mode.is_empty() {
            "conversation".to_string()
        } else {
            request.mode.to_string()
        },
        privacy,
        provider: provider.to_string(),
        model,
        online_allowed,
        ghost_mode: request.ghost_mode,
        offline_required: request.offline_required,
        reason: reason.to_string(),
    }
}

/// Reconcile a contract decision with a request's `force_cloud` flag.
/// `Ok(contract)` on success; `Err` if the caller insisted on cloud but
/// the contract is offline-only.
pub fn enforce(
    request: &ContractRequest<'_>,
    force_cloud: bool,
) -> Result<RouterContract, ContractError> {
    let contract = evaluate(request);
    if force_cloud && !contract.online_allowed {
        return Err(ContractError::BackendUnavailable {
            reason: contract.reason.clone(),
        });
    }
    Ok(contract)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request(intent: Intent) -> ContractRequest<'static> {
        ContractRequest {
            intent,
            mode: "conversation",
            privacy: "internal",
            ghost_mode: false,
            offline_required: false,
        }
    }

    #[test]
    fn design_intent_maps_to_design_contract() {
        let contract = evaluate(&base_request(Intent::Design));
        assert_eq!(contract.model, "mistral-large");
        assert!(contract.online_allowed);
    }

    #[test]
    fn docs_intent_maps_to_chat_contract() {
        let contract = evaluate(&base_request(Intent::Docs));
        assert_eq!(contract.model, "mistral-small");
    }

    #[test]
    fn code_and_test_and_ops_map_to_code_contract() {
        for intent in [Intent::Code, Intent::Test, Intent::Ops] {
            let contract = evaluate(&base_request(intent));
            assert_eq!(contract.model, "devstral-small-2");
        }
    }

    #[test]
    fn ghost_mode_forces_local() {
        let mut request = base_request(Intent::Code);
        request.ghost_mode = true;
        let contract = evaluate(&request);
        assert!(!contract.online_allowed);
        assert_eq!(contract.reason, "ghost_mode");
    }

    #[test]
    fn private_privacy_forces_local() {
        let mut request = base_request(Intent::Code);
        request.privacy = "private";
        let contract = evaluate(&request);
        assert!(!contract.online_allowed);
        assert_eq!(contract.reason, "offline_required_or_private");
    }

    #[test]
    fn offline_required_forces_local() {
        let mut request = base_request(Intent::Code);
        request.offline_required = true;
        let contract = evaluate(&request);
        assert!(!contract.online_allowed);
    }

    #[test]
    fn force_cloud_against_offline_only_contract_fails() {
        let mut request = base_request(Intent::Code);
        request.offline_required = true;
        let result = enforce(&request, true);
        assert!(matches!(
            result,
            Err(ContractError::BackendUnavailable { .. })
        ));
    }

    #[test]
    fn force_cloud_allowed_when_contract_permits_online() {
        let request = base_request(Intent::Code);
        let result = enforce(&request, true);
        assert!(result.is_ok());
    }
}
