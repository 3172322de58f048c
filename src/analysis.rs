//! Keyword analysis of clinician notes.
//!
//! Maps free text to chronic-condition labels by substring matching against
//! a fixed trigger-phrase dictionary. The confidence score is a synthetic
//! uniform value in `[0.7, 1.0)` and carries no model signal; the processing
//! time is a fixed placeholder, not a measurement. Testers should treat both
//! as non-deterministic noise. Analysis never fails: notes with no known
//! trigger get the single fallback label.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed placeholder reported as processing time, in milliseconds.
pub const PROCESSING_MILLIS: u64 = 2000;

/// Label emitted when no trigger phrase matches.
pub const FALLBACK_CONDITION: &str = "Hypertension";

struct KeywordRule {
    label: &'static str,
    triggers: &'static [&'static str],
}

const CARDIOVASCULAR_RULES: &[KeywordRule] = &[
    KeywordRule {
        label: "Cardiac Failure",
        triggers: &[
            "heart failure",
            "cardiac failure",
            "congestive heart failure",
            "chf",
            "left ventricular failure",
        ],
    },
    KeywordRule {
        label: "Cardiomyopathy",
        triggers: &[
            "cardiomyopathy",
            "dilated cardiomyopathy",
            "hypertrophic cardiomyopathy",
        ],
    },
    KeywordRule {
        label: "Coronary Artery Disease",
        triggers: &[
            "coronary artery disease",
            "cad",
            "angina",
            "myocardial infarction",
            "heart attack",
        ],
    },
    KeywordRule {
        label: "Dysrhythmias",
        triggers: &[
            "atrial fibrillation",
            "afib",
            "ventricular tachycardia",
            "arrhythmia",
            "irregular heartbeat",
        ],
    },
    KeywordRule {
        label: "Haemophilia",
        triggers: &[
            "haemophilia",
            "hemophilia",
            "factor viii deficiency",
            "factor ix deficiency",
        ],
    },
    KeywordRule {
        label: "Hyperlipidaemia",
        triggers: &[
            "hyperlipidemia",
            "high cholesterol",
            "elevated lipids",
            "dyslipidemia",
        ],
    },
    KeywordRule {
        label: "Hypertension",
        triggers: &[
            "hypertension",
            "high blood pressure",
            "elevated blood pressure",
            "htn",
        ],
    },
];

const ENDOCRINE_RULES: &[KeywordRule] = &[
    KeywordRule {
        label: "Diabetes Insipidus",
        triggers: &["diabetes insipidus", "di", "vasopressin deficiency"],
    },
    KeywordRule {
        label: "Diabetes Mellitus Type 1",
        triggers: &[
            "diabetes mellitus type 1",
            "type 1 diabetes",
            "insulin dependent diabetes",
            "t1dm",
        ],
    },
    KeywordRule {
        label: "Diabetes Mellitus Type 2",
        triggers: &[
            "diabetes mellitus type 2",
            "type 2 diabetes",
            "non-insulin dependent diabetes",
            "t2dm",
            "diabetes",
        ],
    },
];

/// The outcome of analyzing one set of clinician notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesAnalysis {
    /// Condition labels in table scan order (cardiovascular, then endocrine).
    pub detected_conditions: Vec<String>,
    /// Synthetic score, uniform in [0.7, 1.0). Not a model signal.
    pub confidence: f64,
    /// Fixed placeholder, not a measured duration.
    pub processing_millis: u64,
}

/// Suggest condition labels for free-text clinician notes.
pub fn analyze_notes(notes: &str) -> NotesAnalysis {
    let lower = notes.to_lowercase();
    let mut detected = Vec::new();

    for rule in CARDIOVASCULAR_RULES.iter().chain(ENDOCRINE_RULES) {
        if rule.triggers.iter().any(|trigger| lower.contains(trigger)) {
            detected.push(rule.label.to_string());
        }
    }

    if detected.is_empty() {
        detected.push(FALLBACK_CONDITION.to_string());
    }

    NotesAnalysis {
        detected_conditions: detected,
        confidence: rand::thread_rng().gen_range(0.7..1.0),
        processing_millis: PROCESSING_MILLIS,
    }
}

/// Auxiliary confirmation helper: does the label's text appear in the notes?
/// Case-insensitive, across three spelling variants of the label — verbatim,
/// spaces removed, spaces replaced with hyphens.
pub fn validate_condition(condition: &str, notes: &str) -> bool {
    let notes = notes.to_lowercase();
    let condition = condition.to_lowercase();

    notes.contains(&condition)
        || notes.contains(&condition.replace(' ', ""))
        || notes.contains(&condition.replace(' ', "-"))
}
