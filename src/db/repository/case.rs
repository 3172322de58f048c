//! Case archive persistence: one header row plus four child collections
//! (ICD selections, treatment selections, evidence, medicine selections).
//!
//! `save_case` is a sequence of sub-steps with no cross-step rollback;
//! a backend failure names the step that failed and leaves earlier writes
//! in place. Row ids are generated client-side, and evidence rows reference
//! their owning treatment's generated id directly.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{DatabaseError, SaveStep};
use crate::models::{
    CaseDetail, CaseInput, CaseRecord, Evidence, EvidenceKind, IcdCode, SavedMedicine,
    SavedTreatment,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persist a finished case. Returns the generated case id.
pub fn save_case(conn: &Connection, input: &CaseInput) -> Result<Uuid, DatabaseError> {
    let case_id = Uuid::new_v4();
    let now = chrono::Local::now()
        .naive_local()
        .format(TIMESTAMP_FORMAT)
        .to_string();

    let conditions_json = serde_json::to_string(&input.detected_conditions)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("JSON serialization: {e}")))?;

    conn.execute(
        "INSERT INTO cases (id, patient_notes, detected_conditions, analysis_confidence, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            case_id.to_string(),
            input.patient_notes,
            conditions_json,
            input.analysis_confidence,
            now,
            now,
        ],
    )
    .map_err(|e| step_failed(SaveStep::CaseHeader, e))?;

    for icd in &input.icd_codes {
        conn.execute(
            "INSERT INTO case_icd_codes (id, case_id, icd_code, description, condition)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                case_id.to_string(),
                icd.code,
                icd.description,
                icd.condition,
            ],
        )
        .map_err(|e| step_failed(SaveStep::IcdCodes, e))?;
    }

    for selection in &input.treatments {
        let treatment_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO case_treatments (id, case_id, condition, procedure_name, procedure_code,
             basket_type, quantity, coverage_limit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                treatment_id.to_string(),
                case_id.to_string(),
                selection.treatment.condition,
                selection.treatment.procedure_name,
                selection.treatment.procedure_code,
                selection.treatment.basket_type.as_str(),
                selection.quantity,
                selection.treatment.coverage_limit,
            ],
        )
        .map_err(|e| step_failed(SaveStep::Treatments, e))?;

        for evidence in &selection.evidence {
            let (notes, file_url) = match evidence.kind {
                EvidenceKind::Note => (Some(evidence.content.as_str()), None),
                EvidenceKind::File => (None, Some(evidence.content.as_str())),
            };
            conn.execute(
                "INSERT INTO case_evidence (id, case_id, treatment_id, evidence_type, file_name, notes, file_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    Uuid::new_v4().to_string(),
                    case_id.to_string(),
                    treatment_id.to_string(),
                    evidence.kind.as_str(),
                    evidence.file_name.as_deref().unwrap_or("Note"),
                    notes,
                    file_url,
                ],
            )
            .map_err(|e| step_failed(SaveStep::Evidence, e))?;
        }
    }

    for selection in &input.medicines {
        conn.execute(
            "INSERT INTO case_medicines (id, case_id, condition, medicine_class, medicine_name,
             active_ingredient, cda_core, cda_executive, plan_type, prescription_notes, motivation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                Uuid::new_v4().to_string(),
                case_id.to_string(),
                selection.medicine.condition,
                selection.medicine.medicine_class,
                selection.medicine.medicine_name,
                selection.medicine.active_ingredient,
                selection.medicine.cda_core,
                selection.medicine.cda_executive,
                selection
                    .plan_type
                    .as_ref()
                    .map(|p| p.name.as_str())
                    .unwrap_or(""),
                "",
                selection.motivation.as_deref().unwrap_or(""),
            ],
        )
        .map_err(|e| step_failed(SaveStep::Medicines, e))?;
    }

    tracing::info!(case_id = %case_id, "Saved case");
    Ok(case_id)
}

/// List case headers, newest first.
pub fn list_cases(conn: &Connection) -> Result<Vec<CaseRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_notes, detected_conditions, analysis_confidence, created_at, updated_at
         FROM cases ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(CaseRow {
            id: row.get(0)?,
            patient_notes: row.get(1)?,
            detected_conditions: row.get(2)?,
            analysis_confidence: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    })?;

    let mut cases = Vec::new();
    for row in rows {
        cases.push(case_from_row(row?)?);
    }
    Ok(cases)
}

/// Fetch a case with all nested selections. Fails with `NotFound` when absent.
pub fn get_case(conn: &Connection, case_id: &Uuid) -> Result<CaseDetail, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, patient_notes, detected_conditions, analysis_confidence, created_at, updated_at
         FROM cases WHERE id = ?1",
        params![case_id.to_string()],
        |row| {
            Ok(CaseRow {
                id: row.get(0)?,
                patient_notes: row.get(1)?,
                detected_conditions: row.get(2)?,
                analysis_confidence: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        },
    );

    let case = match result {
        Ok(row) => case_from_row(row)?,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(DatabaseError::NotFound {
                entity_type: "Case".into(),
                id: case_id.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let icd_codes = get_case_icd_codes(conn, case_id)?;
    let treatments = get_case_treatments(conn, case_id)?;
    let medicines = get_case_medicines(conn, case_id)?;

    Ok(CaseDetail {
        case,
        icd_codes,
        treatments,
        medicines,
    })
}

/// Delete a case; children cascade. Fails with `NotFound` when absent.
pub fn delete_case(conn: &Connection, case_id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM cases WHERE id = ?1",
        params![case_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Case".into(),
            id: case_id.to_string(),
        });
    }
    tracing::info!(case_id = %case_id, "Deleted case");
    Ok(())
}

fn get_case_icd_codes(conn: &Connection, case_id: &Uuid) -> Result<Vec<IcdCode>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT icd_code, description, condition FROM case_icd_codes WHERE case_id = ?1",
    )?;
    let rows = stmt.query_map(params![case_id.to_string()], |row| {
        Ok(IcdCode {
            code: row.get(0)?,
            description: row.get(1)?,
            condition: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn get_case_treatments(
    conn: &Connection,
    case_id: &Uuid,
) -> Result<Vec<SavedTreatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, case_id, condition, procedure_name, procedure_code, basket_type, quantity, coverage_limit
         FROM case_treatments WHERE case_id = ?1",
    )?;

    let rows = stmt.query_map(params![case_id.to_string()], |row| {
        Ok(TreatmentRow {
            id: row.get(0)?,
            case_id: row.get(1)?,
            condition: row.get(2)?,
            procedure_name: row.get(3)?,
            procedure_code: row.get(4)?,
            basket_type: row.get(5)?,
            quantity: row.get(6)?,
            coverage_limit: row.get(7)?,
        })
    })?;

    let mut treatments = Vec::new();
    for row in rows {
        let row = row?;
        let id = parse_uuid(&row.id)?;
        let evidence = get_treatment_evidence(conn, &id)?;
        treatments.push(SavedTreatment {
            id,
            case_id: parse_uuid(&row.case_id)?,
            condition: row.condition,
            procedure_name: row.procedure_name,
            procedure_code: row.procedure_code,
            basket_type: row.basket_type,
            quantity: row.quantity as u32,
            coverage_limit: row.coverage_limit as u32,
            evidence,
        });
    }
    Ok(treatments)
}

fn get_treatment_evidence(
    conn: &Connection,
    treatment_id: &Uuid,
) -> Result<Vec<Evidence>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT evidence_type, file_name, notes, file_url
         FROM case_evidence WHERE treatment_id = ?1",
    )?;
    let rows = stmt.query_map(params![treatment_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut evidence = Vec::new();
    for row in rows {
        let (evidence_type, file_name, notes, file_url) = row?;
        evidence.push(Evidence {
            kind: evidence_type.parse::<EvidenceKind>()?,
            content: notes.or(file_url).unwrap_or_default(),
            file_name: Some(file_name),
        });
    }
    Ok(evidence)
}

fn get_case_medicines(
    conn: &Connection,
    case_id: &Uuid,
) -> Result<Vec<SavedMedicine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, case_id, condition, medicine_class, medicine_name, active_ingredient,
         cda_core, cda_executive, plan_type, prescription_notes, motivation
         FROM case_medicines WHERE case_id = ?1",
    )?;

    let rows = stmt.query_map(params![case_id.to_string()], |row| {
        Ok(MedicineRow {
            id: row.get(0)?,
            case_id: row.get(1)?,
            condition: row.get(2)?,
            medicine_class: row.get(3)?,
            medicine_name: row.get(4)?,
            active_ingredient: row.get(5)?,
            cda_core: row.get(6)?,
            cda_executive: row.get(7)?,
            plan_type: row.get(8)?,
            prescription_notes: row.get(9)?,
            motivation: row.get(10)?,
        })
    })?;

    let mut medicines = Vec::new();
    for row in rows {
        let row = row?;
        medicines.push(SavedMedicine {
            id: parse_uuid(&row.id)?,
            case_id: parse_uuid(&row.case_id)?,
            condition: row.condition,
            medicine_class: row.medicine_class,
            medicine_name: row.medicine_name,
            active_ingredient: row.active_ingredient,
            cda_core: row.cda_core,
            cda_executive: row.cda_executive,
            plan_type: row.plan_type,
            prescription_notes: row.prescription_notes,
            motivation: row.motivation,
        });
    }
    Ok(medicines)
}

// Internal row types for mapping

struct CaseRow {
    id: String,
    patient_notes: String,
    detected_conditions: String,
    analysis_confidence: f64,
    created_at: String,
    updated_at: String,
}

struct TreatmentRow {
    id: String,
    case_id: String,
    condition: String,
    procedure_name: String,
    procedure_code: String,
    basket_type: String,
    quantity: i64,
    coverage_limit: i64,
}

struct MedicineRow {
    id: String,
    case_id: String,
    condition: String,
    medicine_class: String,
    medicine_name: String,
    active_ingredient: String,
    cda_core: f64,
    cda_executive: f64,
    plan_type: String,
    prescription_notes: String,
    motivation: String,
}

fn case_from_row(row: CaseRow) -> Result<CaseRecord, DatabaseError> {
    Ok(CaseRecord {
        id: parse_uuid(&row.id)?,
        patient_notes: row.patient_notes,
        detected_conditions: serde_json::from_str(&row.detected_conditions).unwrap_or_default(),
        analysis_confidence: row.analysis_confidence,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .unwrap_or_default()
}

fn step_failed(step: SaveStep, e: rusqlite::Error) -> DatabaseError {
    DatabaseError::StepFailed {
        step,
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{
        BasketType, EvidenceKind, Medicine, MedicineSelection, PlanCategory, PlanType, Treatment,
        TreatmentSelection,
    };

    fn treatment(code: &str, basket_type: BasketType, limit: u32) -> Treatment {
        Treatment {
            condition: "Hypertension".into(),
            procedure_name: "Consultation".into(),
            procedure_code: code.into(),
            coverage_limit: limit,
            basket_type,
        }
    }

    fn medicine(name: &str) -> Medicine {
        Medicine {
            condition: "Hypertension".into(),
            medicine_class: "ACE Inhibitors".into(),
            active_ingredient: "Enalapril".into(),
            medicine_name: name.into(),
            strength: String::new(),
            cda_core: 120.0,
            cda_executive: 180.5,
            plan_exclusions: Vec::new(),
        }
    }

    fn full_input() -> CaseInput {
        let mut diagnostic = TreatmentSelection::new(treatment("0191", BasketType::Diagnostic, 2), 1);
        diagnostic.attach(Evidence {
            kind: EvidenceKind::Note,
            content: "BP readings over 3 months".into(),
            file_name: None,
        });
        diagnostic.attach(Evidence {
            kind: EvidenceKind::File,
            content: "uploads/ecg.pdf".into(),
            file_name: Some("ecg.pdf".into()),
        });
        let ongoing =
            TreatmentSelection::new(treatment("0192", BasketType::OngoingManagement, 12), 6);

        let mut selection = MedicineSelection::new(medicine("Enap 10mg"));
        selection.plan_type = Some(PlanType {
            id: "core".into(),
            name: "Core Plans".into(),
            category: PlanCategory::Core,
        });
        selection.motivation = Some("Stable on current therapy".into());

        CaseInput {
            patient_notes: "Patient has hypertension, poorly controlled.".into(),
            detected_conditions: vec!["Hypertension".into()],
            analysis_confidence: 0.85,
            icd_codes: vec![
                IcdCode {
                    code: "I10".into(),
                    description: "Essential (primary) hypertension".into(),
                    condition: "Hypertension".into(),
                },
                IcdCode {
                    code: "I11.9".into(),
                    description: "Hypertensive heart disease".into(),
                    condition: "Hypertension".into(),
                },
            ],
            treatments: vec![diagnostic, ongoing],
            medicines: vec![selection],
        }
    }

    #[test]
    fn round_trip_full_case() {
        let conn = open_memory_database().unwrap();
        let input = full_input();
        let case_id = save_case(&conn, &input).unwrap();

        let detail = get_case(&conn, &case_id).unwrap();
        assert_eq!(detail.case.id, case_id);
        assert_eq!(detail.case.patient_notes, input.patient_notes);
        assert_eq!(detail.case.detected_conditions, input.detected_conditions);
        assert_eq!(detail.case.analysis_confidence, 0.85);

        assert_eq!(detail.icd_codes.len(), 2);
        assert!(detail.icd_codes.iter().any(|c| c.code == "I10"));

        assert_eq!(detail.treatments.len(), 2);
        let diagnostic = detail
            .treatments
            .iter()
            .find(|t| t.basket_type == "diagnostic")
            .unwrap();
        assert_eq!(diagnostic.procedure_code, "0191");
        assert_eq!(diagnostic.quantity, 1);
        assert_eq!(diagnostic.coverage_limit, 2);
        assert_eq!(diagnostic.evidence.len(), 2);
        let note = diagnostic
            .evidence
            .iter()
            .find(|e| e.kind == EvidenceKind::Note)
            .unwrap();
        assert_eq!(note.content, "BP readings over 3 months");
        assert_eq!(note.file_name.as_deref(), Some("Note"));
        let file = diagnostic
            .evidence
            .iter()
            .find(|e| e.kind == EvidenceKind::File)
            .unwrap();
        assert_eq!(file.content, "uploads/ecg.pdf");
        assert_eq!(file.file_name.as_deref(), Some("ecg.pdf"));

        let ongoing = detail
            .treatments
            .iter()
            .find(|t| t.basket_type == "ongoing_management")
            .unwrap();
        assert_eq!(ongoing.quantity, 6);
        assert!(ongoing.evidence.is_empty());

        assert_eq!(detail.medicines.len(), 1);
        let med = &detail.medicines[0];
        assert_eq!(med.medicine_name, "Enap 10mg");
        assert_eq!(med.cda_core, 120.0);
        assert_eq!(med.cda_executive, 180.5);
        assert_eq!(med.plan_type, "Core Plans");
        assert_eq!(med.motivation, "Stable on current therapy");
        assert_eq!(med.prescription_notes, "");
    }

    #[test]
    fn evidence_stays_with_owning_treatment_despite_shared_procedure_code() {
        let conn = open_memory_database().unwrap();

        // Same procedure code in both baskets — the collision the id scheme resolves.
        let mut first = TreatmentSelection::new(treatment("0199", BasketType::Diagnostic, 2), 1);
        first.attach(Evidence {
            kind: EvidenceKind::Note,
            content: "diagnostic evidence".into(),
            file_name: None,
        });
        let mut second =
            TreatmentSelection::new(treatment("0199", BasketType::OngoingManagement, 12), 3);
        second.attach(Evidence {
            kind: EvidenceKind::Note,
            content: "ongoing evidence".into(),
            file_name: None,
        });

        let input = CaseInput {
            patient_notes: "notes".into(),
            detected_conditions: vec!["Hypertension".into()],
            analysis_confidence: 0.7,
            icd_codes: vec![],
            treatments: vec![first, second],
            medicines: vec![],
        };

        let case_id = save_case(&conn, &input).unwrap();
        let detail = get_case(&conn, &case_id).unwrap();

        let diagnostic = detail
            .treatments
            .iter()
            .find(|t| t.basket_type == "diagnostic")
            .unwrap();
        assert_eq!(diagnostic.evidence.len(), 1);
        assert_eq!(diagnostic.evidence[0].content, "diagnostic evidence");

        let ongoing = detail
            .treatments
            .iter()
            .find(|t| t.basket_type == "ongoing_management")
            .unwrap();
        assert_eq!(ongoing.evidence.len(), 1);
        assert_eq!(ongoing.evidence[0].content, "ongoing evidence");
    }

    #[test]
    fn list_orders_newest_first() {
        let conn = open_memory_database().unwrap();
        let older = save_case(&conn, &full_input()).unwrap();
        let newer = save_case(&conn, &full_input()).unwrap();

        // Force distinct creation times; saves within one second would tie.
        conn.execute(
            "UPDATE cases SET created_at = '2024-01-01 08:00:00' WHERE id = ?1",
            params![older.to_string()],
        )
        .unwrap();
        conn.execute(
            "UPDATE cases SET created_at = '2024-06-01 08:00:00' WHERE id = ?1",
            params![newer.to_string()],
        )
        .unwrap();

        let cases = list_cases(&conn).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, newer);
        assert_eq!(cases[1].id, older);
    }

    #[test]
    fn delete_removes_case_and_children() {
        let conn = open_memory_database().unwrap();
        let case_id = save_case(&conn, &full_input()).unwrap();

        delete_case(&conn, &case_id).unwrap();

        assert!(list_cases(&conn).unwrap().is_empty());
        assert!(matches!(
            get_case(&conn, &case_id),
            Err(DatabaseError::NotFound { .. })
        ));

        for table in [
            "case_icd_codes",
            "case_treatments",
            "case_evidence",
            "case_medicines",
        ] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0, "{table} not cascaded");
        }
    }

    #[test]
    fn get_missing_case_fails() {
        let conn = open_memory_database().unwrap();
        let result = get_case(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn delete_missing_case_fails() {
        let conn = open_memory_database().unwrap();
        let result = delete_case(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn save_with_no_children_succeeds() {
        let conn = open_memory_database().unwrap();
        let input = CaseInput {
            patient_notes: "short note".into(),
            detected_conditions: vec![],
            analysis_confidence: 0.9,
            icd_codes: vec![],
            treatments: vec![],
            medicines: vec![],
        };
        let case_id = save_case(&conn, &input).unwrap();
        let detail = get_case(&conn, &case_id).unwrap();
        assert!(detail.icd_codes.is_empty());
        assert!(detail.treatments.is_empty());
        assert!(detail.medicines.is_empty());
    }
}
