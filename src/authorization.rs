//! PMB lookup & compliance service.
//!
//! Resolves a confirmed condition label to its candidate ICD codes,
//! treatment baskets, and medicine list, and reviews a finished selection
//! set for scheme compliance.
//!
//! Matching policy: a reference entry matches a query when either condition
//! text contains the other, case-insensitively. The rule is deliberately
//! loose — it tolerates partial and abbreviated labels from the notes
//! analyzer at the cost of over-matching on very short queries. Tightening
//! it changes which treatments and medicines a condition resolves to and
//! must be a versioned rule change.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{
    ComplianceStatus, IcdCode, Medicine, MedicineSelection, PlanCategory, PlanType, Treatment,
    TreatmentSelection,
};
use crate::reference::ReferenceData;

/// Lookup service over the loaded reference snapshot. Plain constructed
/// instance; share the snapshot by `Arc`, no global state.
pub struct AuthorizationService {
    reference: Arc<ReferenceData>,
}

/// A condition's treatments split into the two baskets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentBasket {
    pub diagnostic: Vec<Treatment>,
    pub ongoing_management: Vec<Treatment>,
}

/// Outcome of a compliance review, with the recomputed candidate sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReview {
    pub status: ComplianceStatus,
    pub available_codes: Vec<IcdCode>,
    pub available_treatments: Vec<Treatment>,
    pub available_medicines: Vec<Medicine>,
}

impl AuthorizationService {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { reference }
    }

    /// ICD codes whose condition matches the query, both directions.
    pub fn codes_for(&self, condition: &str) -> Vec<IcdCode> {
        self.reference
            .icd_codes()
            .into_iter()
            .filter(|icd| condition_matches(&icd.condition, condition))
            .collect()
    }

    /// Treatments whose condition matches the query, both directions.
    pub fn treatments_for(&self, condition: &str) -> Vec<Treatment> {
        self.reference
            .treatments
            .iter()
            .filter(|treatment| condition_matches(&treatment.condition, condition))
            .cloned()
            .collect()
    }

    /// Medicines whose condition matches the query. When a plan is given,
    /// entries excluded on that plan's category are dropped.
    pub fn medicines_for(&self, condition: &str, plan: Option<&PlanType>) -> Vec<Medicine> {
        self.reference
            .medicines
            .iter()
            .filter(|medicine| condition_matches(&medicine.condition, condition))
            .filter(|medicine| match plan {
                Some(plan) => !is_excluded(medicine, plan),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Treatments for a condition, split into the two baskets.
    pub fn treatment_basket(&self, condition: &str) -> TreatmentBasket {
        let (diagnostic, ongoing_management) = self
            .treatments_for(condition)
            .into_iter()
            .partition(|t| t.basket_type == crate::models::BasketType::Diagnostic);
        TreatmentBasket {
            diagnostic,
            ongoing_management,
        }
    }

    /// Deduplicated medicine classes for a condition, first-seen order.
    pub fn medicine_classes(&self, condition: &str) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for medicine in self.medicines_for(condition, None) {
            if !classes.contains(&medicine.medicine_class) {
                classes.push(medicine.medicine_class);
            }
        }
        classes
    }

    /// The fixed plan-tier enumeration.
    pub fn plan_types(&self) -> Vec<PlanType> {
        crate::models::plan_types()
    }

    /// Review a finished selection set against the recomputed candidate sets.
    ///
    /// Every selected ICD code must match by code string, every treatment by
    /// (procedure code, basket type), every medicine by name; any miss is
    /// `non_compliant`. Otherwise any selected medicine carrying exclusions —
    /// on any plan, not just the active one — downgrades to
    /// `requires_review`. That over-breadth is source behavior, kept as-is.
    pub fn compliance_check(
        &self,
        condition: &str,
        selected_codes: &[IcdCode],
        selected_treatments: &[TreatmentSelection],
        selected_medicines: &[MedicineSelection],
    ) -> ComplianceReview {
        let available_codes = self.codes_for(condition);
        let available_treatments = self.treatments_for(condition);
        let available_medicines = self.medicines_for(condition, None);

        let codes_ok = selected_codes.iter().all(|selected| {
            available_codes
                .iter()
                .any(|available| available.code == selected.code)
        });

        let treatments_ok = selected_treatments.iter().all(|selected| {
            available_treatments.iter().any(|available| {
                available.procedure_code == selected.treatment.procedure_code
                    && available.basket_type == selected.treatment.basket_type
            })
        });

        let medicines_ok = selected_medicines.iter().all(|selected| {
            available_medicines
                .iter()
                .any(|available| available.medicine_name == selected.medicine.medicine_name)
        });

        let status = if !codes_ok || !treatments_ok || !medicines_ok {
            ComplianceStatus::NonCompliant
        } else if selected_medicines
            .iter()
            .any(|selected| !selected.medicine.plan_exclusions.is_empty())
        {
            ComplianceStatus::RequiresReview
        } else {
            ComplianceStatus::Compliant
        };

        ComplianceReview {
            status,
            available_codes,
            available_treatments,
            available_medicines,
        }
    }

    /// Names of selected medicines that need a motivation but lack one.
    pub fn missing_motivations(&self, selections: &[MedicineSelection]) -> Vec<String> {
        selections
            .iter()
            .filter(|selection| {
                requires_motivation(&selection.medicine, selection.plan_type.as_ref())
                    && selection
                        .motivation
                        .as_deref()
                        .map(str::trim)
                        .unwrap_or("")
                        .is_empty()
            })
            .map(|selection| selection.medicine.medicine_name.clone())
            .collect()
    }
}

/// Bidirectional case-insensitive substring match between condition texts.
fn condition_matches(entry: &str, query: &str) -> bool {
    let entry = entry.to_lowercase();
    let query = query.to_lowercase();
    entry.contains(&query) || query.contains(&entry)
}

/// The Chronic Disease Amount applicable to a medicine on a plan.
/// Executive-tier amounts apply to executive and comprehensive plans only;
/// everything else, including no plan, gets the core amount.
pub fn cda_for(medicine: &Medicine, plan: Option<&PlanType>) -> f64 {
    match plan.map(|p| &p.category) {
        Some(PlanCategory::Executive) | Some(PlanCategory::Comprehensive) => {
            medicine.cda_executive
        }
        _ => medicine.cda_core,
    }
}

/// Whether the medicine's exclusion list names the plan's category string.
/// Exclusion lists hold free-form strings (the data only ever derives
/// "KeyCare", which is not one of the five plan categories), so this can
/// stay permanently false for every real plan — a documented mismatch.
pub fn is_excluded(medicine: &Medicine, plan: &PlanType) -> bool {
    medicine
        .plan_exclusions
        .iter()
        .any(|excluded| excluded == plan.category.as_str())
}

/// Whether selecting this medicine on this plan demands a written motivation.
pub fn requires_motivation(medicine: &Medicine, plan: Option<&PlanType>) -> bool {
    match plan {
        Some(plan) => is_excluded(medicine, plan),
        None => false,
    }
}
