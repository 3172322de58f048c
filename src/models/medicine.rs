use serde::{Deserialize, Serialize};

use super::plan::PlanType;

/// A drug entry from the PMB medicine lists. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub condition: String,
    pub medicine_class: String,
    pub active_ingredient: String,
    pub medicine_name: String,
    pub strength: String,
    /// Chronic Disease Amount on Core-tier plans.
    pub cda_core: f64,
    /// Chronic Disease Amount on Executive-tier plans.
    pub cda_executive: f64,
    /// Plan-category strings this medicine is excluded from. Empty means none.
    /// Holds free-form strings (e.g. "KeyCare"), not `PlanCategory` values.
    #[serde(default)]
    pub plan_exclusions: Vec<String>,
}

/// A medicine chosen for a case, with the member's plan and any motivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineSelection {
    pub medicine: Medicine,
    pub plan_type: Option<PlanType>,
    /// Required non-empty when the medicine is excluded on the chosen plan.
    pub motivation: Option<String>,
}

impl MedicineSelection {
    pub fn new(medicine: Medicine) -> Self {
        Self {
            medicine,
            plan_type: None,
            motivation: None,
        }
    }
}
