use serde::{Deserialize, Serialize};

use super::enums::{BasketType, EvidenceKind};

/// A procedure from the PMB treatment baskets. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub condition: String,
    pub procedure_name: String,
    pub procedure_code: String,
    /// Maximum annual units covered for this procedure.
    pub coverage_limit: u32,
    pub basket_type: BasketType,
}

/// Supporting material attached to one treatment selection within one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub kind: EvidenceKind,
    /// Note text, or an opaque file reference for `EvidenceKind::File`.
    pub content: String,
    pub file_name: Option<String>,
}

/// A treatment chosen for a case, with the requested unit count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentSelection {
    pub treatment: Treatment,
    pub quantity: u32,
    pub evidence: Vec<Evidence>,
}

impl TreatmentSelection {
    /// Quantity is clamped to `[0, coverage_limit]`.
    pub fn new(treatment: Treatment, quantity: u32) -> Self {
        let quantity = quantity.min(treatment.coverage_limit);
        Self {
            treatment,
            quantity,
            evidence: Vec::new(),
        }
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.min(self.treatment.coverage_limit);
    }

    pub fn attach(&mut self, evidence: Evidence) {
        self.evidence.push(evidence);
    }
}
