//! The router contract's decision shape (§4.2 step 5).

use serde::{Deserialize, Serialize};
use wizard_core::classification::Intent;

/// The three contract intents a classification intent collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractIntent {
    Design,
    Chat,
    Code,
}

impl ContractIntent {
    /// `design → design`, `docs → chat`, everything else → `code`.
    pub fn from_classification_intent(intent: Intent) -> Self {
        match intent {
            Intent::Design => ContractIntent::Design,
            Intent::Docs => ContractIntent::Chat,
            Intent::Code | Intent::Test | Intent::Ops => ContractIntent::Code,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ContractIntent::Chat => "mistral-small",
            ContractIntent::Design => "mistral-large",
            ContractIntent::Code => "devstral-small-2",
        }
    }
}

/// The contract's decision for one completion request: which model to
/// use and whether cloud routing is allowed at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterContract {
    pub intent: ContractIntent,
    pub mode: String,
    pub privacy: String,
    pub provider: String,
    pub model: String,
    pub online_allowed: bool,
    pub ghost_mode: bool,
    pub offline_required: bool,
    pub reason: String,
}
