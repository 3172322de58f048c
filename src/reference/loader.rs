//! Parsers for the six delimited PMB reference files.
//!
//! The parsing rules are fixed for compatibility with the existing data
//! files: comma-split with trimmed fields, per-kind header skips, malformed
//! rows dropped silently, numeric fields defaulting to zero. A file that
//! cannot be read contributes nothing; the loader never fails.

use std::fs;
use std::path::Path;

use crate::models::{BasketType, Condition, ConditionCategory, Medicine, Treatment};

use super::ReferenceData;

pub const CARDIOVASCULAR_CONDITIONS_FILE: &str = "Cardiovascular CONDITIONS.csv";
pub const ENDOCRINE_CONDITIONS_FILE: &str = "Endocrine CONDITIONS.csv";
pub const CARDIOVASCULAR_TREATMENT_FILE: &str = "Cardiovascular TREATMENT.csv";
pub const ENDOCRINE_TREATMENT_FILE: &str = "Endocrine TREATMENT.csv";
pub const CARDIOVASCULAR_MEDICINE_FILE: &str = "Cardiovascular MEDICINE.csv";
pub const ENDOCRINE_MEDICINE_FILE: &str = "Endocrine MEDICINE.csv";

/// The marker phrase in a medicine name that derives a KeyCare exclusion.
/// This is the only exclusion-derivation rule in the data.
const KEYCARE_EXCLUSION_PHRASE: &str = "Not available on KeyCare plans";

/// Load all three reference tables from `dir`.
pub fn load_reference_data(dir: &Path) -> ReferenceData {
    ReferenceData {
        conditions: load_conditions(dir),
        treatments: load_treatments(dir),
        medicines: load_medicines(dir),
    }
}

/// Union of the cardiovascular and endocrine condition files.
pub fn load_conditions(dir: &Path) -> Vec<Condition> {
    let mut conditions = parse_conditions(
        &read_source(dir, CARDIOVASCULAR_CONDITIONS_FILE),
        ConditionCategory::Cardiovascular,
    );
    conditions.extend(parse_conditions(
        &read_source(dir, ENDOCRINE_CONDITIONS_FILE),
        ConditionCategory::Endocrine,
    ));
    conditions
}

/// Union of the cardiovascular and endocrine treatment files.
pub fn load_treatments(dir: &Path) -> Vec<Treatment> {
    let mut treatments = parse_treatments(&read_source(dir, CARDIOVASCULAR_TREATMENT_FILE));
    treatments.extend(parse_treatments(&read_source(dir, ENDOCRINE_TREATMENT_FILE)));
    treatments
}

/// Union of the cardiovascular and endocrine medicine files.
pub fn load_medicines(dir: &Path) -> Vec<Medicine> {
    let mut medicines = parse_medicines(&read_source(dir, CARDIOVASCULAR_MEDICINE_FILE));
    medicines.extend(parse_medicines(&read_source(dir, ENDOCRINE_MEDICINE_FILE)));
    medicines
}

fn read_source(dir: &Path, file: &str) -> String {
    match fs::read_to_string(dir.join(file)) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to read reference source {file}: {e}");
            String::new()
        }
    }
}

/// One header row; three required fields (name, code, description).
fn parse_conditions(text: &str, category: ConditionCategory) -> Vec<Condition> {
    let mut conditions = Vec::new();
    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            continue;
        }
        let (name, icd_code, description) = (fields[0], fields[1], fields[2]);
        if name.is_empty() || icd_code.is_empty() || description.is_empty() {
            continue;
        }
        conditions.push(Condition {
            name: name.into(),
            icd_code: icd_code.into(),
            description: description.into(),
            category: category.clone(),
        });
    }
    conditions
}

/// Two header rows; each data row carries a diagnostic procedure in fields
/// 0-3 and an ongoing-management procedure in fields 4-6, either of which
/// is emitted only when its name and code are both present.
fn parse_treatments(text: &str) -> Vec<Treatment> {
    let mut treatments = Vec::new();
    for line in text.lines().skip(2) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 7 {
            continue;
        }
        let condition = fields[0];
        if condition.is_empty() {
            continue;
        }

        if !fields[1].is_empty() && !fields[2].is_empty() {
            treatments.push(Treatment {
                condition: condition.into(),
                procedure_name: fields[1].into(),
                procedure_code: fields[2].into(),
                coverage_limit: fields[3].parse().unwrap_or(0),
                basket_type: BasketType::Diagnostic,
            });
        }

        if !fields[4].is_empty() && !fields[5].is_empty() {
            treatments.push(Treatment {
                condition: condition.into(),
                procedure_name: fields[4].into(),
                procedure_code: fields[5].into(),
                coverage_limit: fields[6].parse().unwrap_or(0),
                basket_type: BasketType::OngoingManagement,
            });
        }
    }
    treatments
}

/// One header row; six required fields. Currency fields carry a leading
/// rand marker ("R ") which is stripped before parsing.
fn parse_medicines(text: &str) -> Vec<Medicine> {
    let mut medicines = Vec::new();
    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 6 {
            continue;
        }
        let condition = fields[0];
        let medicine_class = fields[3];
        let active_ingredient = fields[4];
        let medicine_name = fields[5];
        if condition.is_empty()
            || medicine_class.is_empty()
            || active_ingredient.is_empty()
            || medicine_name.is_empty()
        {
            continue;
        }

        let plan_exclusions = if medicine_name.contains(KEYCARE_EXCLUSION_PHRASE) {
            vec!["KeyCare".to_string()]
        } else {
            Vec::new()
        };

        medicines.push(Medicine {
            condition: condition.into(),
            medicine_class: medicine_class.into(),
            active_ingredient: active_ingredient.into(),
            medicine_name: medicine_name.into(),
            strength: String::new(),
            cda_core: parse_currency(fields[1]),
            cda_executive: parse_currency(fields[2]),
            plan_exclusions,
        });
    }
    medicines
}

/// Strip the leading currency marker and thousands separators; 0.0 on failure.
fn parse_currency(raw: &str) -> f64 {
    raw.trim_start_matches("R ").replace(',', "").parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn conditions_skip_header_and_malformed_rows() {
        let text = "Condition,ICD Code,Description\n\
                    Hypertension,I10,Essential hypertension\n\
                    MissingFields,I99\n\
                    ,I10,No name\n\
                    \n\
                    Cardiomyopathy,I42.9,Cardiomyopathy unspecified\n";
        let conditions = parse_conditions(text, ConditionCategory::Cardiovascular);
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].name, "Hypertension");
        assert_eq!(conditions[0].icd_code, "I10");
        assert_eq!(conditions[1].name, "Cardiomyopathy");
    }

    #[test]
    fn conditions_fields_are_trimmed() {
        let text = "header,header,header\n  Hypertension , I10 , Essential hypertension \n";
        let conditions = parse_conditions(text, ConditionCategory::Cardiovascular);
        assert_eq!(conditions[0].name, "Hypertension");
        assert_eq!(conditions[0].description, "Essential hypertension");
    }

    #[test]
    fn treatments_skip_two_header_rows() {
        let text = "Treatment baskets,,,,,,\n\
                    Condition,Diagnostic,Code,Limit,Ongoing,Code,Limit\n\
                    Hypertension,Consultation (GP),0191,2,Follow-up consultation,0192,12\n";
        let treatments = parse_treatments(text);
        assert_eq!(treatments.len(), 2);
        assert_eq!(treatments[0].basket_type, BasketType::Diagnostic);
        assert_eq!(treatments[0].procedure_code, "0191");
        assert_eq!(treatments[0].coverage_limit, 2);
        assert_eq!(treatments[1].basket_type, BasketType::OngoingManagement);
        assert_eq!(treatments[1].procedure_code, "0192");
        assert_eq!(treatments[1].coverage_limit, 12);
    }

    #[test]
    fn treatment_row_with_only_diagnostic_emits_one_record() {
        let text = "h,,,,,,\nh,,,,,,\nHypertension,Consultation,0191,2,,,\n";
        let treatments = parse_treatments(text);
        assert_eq!(treatments.len(), 1);
        assert_eq!(treatments[0].basket_type, BasketType::Diagnostic);
    }

    #[test]
    fn treatment_row_with_only_ongoing_emits_one_record() {
        let text = "h,,,,,,\nh,,,,,,\nHypertension,,,0,Follow-up,0192,12\n";
        let treatments = parse_treatments(text);
        assert_eq!(treatments.len(), 1);
        assert_eq!(treatments[0].basket_type, BasketType::OngoingManagement);
    }

    #[test]
    fn treatment_rows_needing_seven_fields_are_dropped() {
        let text = "h,,,,,,\nh,,,,,,\nHypertension,Consultation,0191,2\n";
        assert!(parse_treatments(text).is_empty());
    }

    #[test]
    fn unparseable_coverage_limit_defaults_to_zero() {
        let text = "h,,,,,,\nh,,,,,,\nHypertension,Consultation,0191,often,Follow-up,0192,n/a\n";
        let treatments = parse_treatments(text);
        assert_eq!(treatments[0].coverage_limit, 0);
        assert_eq!(treatments[1].coverage_limit, 0);
    }

    #[test]
    fn medicines_parse_currency_and_required_fields() {
        let text = "Condition,CDA Core,CDA Executive,Class,Active Ingredient,Medicine\n\
                    Hypertension,R 137.50,R 205.00,ACE Inhibitors,Enalapril,Enap 10mg\n\
                    Hypertension,,,Missing class,,\n";
        let medicines = parse_medicines(text);
        assert_eq!(medicines.len(), 1);
        let med = &medicines[0];
        assert_eq!(med.medicine_name, "Enap 10mg");
        assert_eq!(med.cda_core, 137.5);
        assert_eq!(med.cda_executive, 205.0);
        assert_eq!(med.strength, "");
        assert!(med.plan_exclusions.is_empty());
    }

    #[test]
    fn unparseable_currency_defaults_to_zero() {
        let text = "h,h,h,h,h,h\nHypertension,TBC,R 205.00,ACE Inhibitors,Enalapril,Enap 10mg\n";
        let medicines = parse_medicines(text);
        assert_eq!(medicines[0].cda_core, 0.0);
        assert_eq!(medicines[0].cda_executive, 205.0);
    }

    #[test]
    fn keycare_phrase_derives_exclusion() {
        let text = "h,h,h,h,h,h\n\
                    Hypertension,R 90.00,R 120.00,Beta Blockers,Atenolol,Tenormin (Not available on KeyCare plans)\n\
                    Hypertension,R 90.00,R 120.00,Beta Blockers,Atenolol,Tenormin\n";
        let medicines = parse_medicines(text);
        assert_eq!(medicines[0].plan_exclusions, vec!["KeyCare".to_string()]);
        assert!(medicines[1].plan_exclusions.is_empty());
    }

    #[test]
    fn load_unions_category_files_and_tolerates_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CARDIOVASCULAR_CONDITIONS_FILE),
            "h,h,h\nHypertension,I10,Essential hypertension\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(ENDOCRINE_CONDITIONS_FILE),
            "h,h,h\nDiabetes Mellitus Type 2,E11.9,Type 2 diabetes mellitus\n",
        )
        .unwrap();
        // No treatment or medicine files at all.

        let data = load_reference_data(dir.path());
        assert_eq!(data.conditions.len(), 2);
        assert_eq!(
            data.conditions[0].category,
            ConditionCategory::Cardiovascular
        );
        assert_eq!(data.conditions[1].category, ConditionCategory::Endocrine);
        assert!(data.treatments.is_empty());
        assert!(data.medicines.is_empty());
    }
}
