use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::condition::IcdCode;
use super::medicine::MedicineSelection;
use super::treatment::{Evidence, TreatmentSelection};

/// A persisted case header, as listed in the case archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: Uuid,
    pub patient_notes: String,
    pub detected_conditions: Vec<String>,
    pub analysis_confidence: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Everything the wizard assembled for one case, handed to `save_case`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseInput {
    pub patient_notes: String,
    pub detected_conditions: Vec<String>,
    pub analysis_confidence: f64,
    pub icd_codes: Vec<IcdCode>,
    pub treatments: Vec<TreatmentSelection>,
    pub medicines: Vec<MedicineSelection>,
}

/// A treatment row as persisted, with its generated id and linked evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTreatment {
    pub id: Uuid,
    pub case_id: Uuid,
    pub condition: String,
    pub procedure_name: String,
    pub procedure_code: String,
    pub basket_type: String,
    pub quantity: u32,
    pub coverage_limit: u32,
    pub evidence: Vec<Evidence>,
}

/// A medicine row as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMedicine {
    pub id: Uuid,
    pub case_id: Uuid,
    pub condition: String,
    pub medicine_class: String,
    pub medicine_name: String,
    pub active_ingredient: String,
    pub cda_core: f64,
    pub cda_executive: f64,
    pub plan_type: String,
    pub prescription_notes: String,
    pub motivation: String,
}

/// A fully-hydrated case: header plus every nested selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseDetail {
    pub case: CaseRecord,
    pub icd_codes: Vec<IcdCode>,
    pub treatments: Vec<SavedTreatment>,
    pub medicines: Vec<SavedMedicine>,
}
