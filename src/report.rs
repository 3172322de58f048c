//! Claim document rendering.
//!
//! Pure assembly: a fully-built claim structure goes in, PDF bytes come
//! out. No storage or network access. The layout is a single A4 flow with
//! continuation pages when a section runs past the bottom margin.

use std::io::BufWriter;

use printpdf::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authorization::cda_for;
use crate::models::{EvidenceKind, IcdCode, MedicineSelection, TreatmentSelection};

/// Everything the wizard assembled for one claim, ready to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDocument {
    pub original_note: String,
    pub confirmed_conditions: Vec<String>,
    pub selected_icd_codes: Vec<IcdCode>,
    pub diagnostic_treatments: Vec<TreatmentSelection>,
    pub management_treatments: Vec<TreatmentSelection>,
    pub medicine_selections: Vec<MedicineSelection>,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF write error: {0}")]
    Write(String),
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP_Y: f32 = 280.0;
const BOTTOM_MARGIN: f32 = 20.0;

/// Render a claim into a self-contained PDF. Returns the document bytes.
pub fn render_claim_pdf(claim: &ClaimDocument) -> Result<Vec<u8>, ReportError> {
    let (doc, page1, layer1) = PdfDocument::new(
        "PMB Chronic Treatment Claim",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Font(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Font(e.to_string()))?;
    let courier = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| ReportError::Font(e.to_string()))?;

    let mut cursor = PageCursor {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        y: Mm(TOP_Y),
    };

    cursor.line("PMB Chronic Treatment Claim", 14.0, 20.0, &bold, 10.0);

    cursor.line("CLINICAL NOTES:", 11.0, 20.0, &bold, 6.0);
    for line in wrap_text(&claim.original_note, 90) {
        cursor.line(&line, 9.0, 25.0, &font, 4.5);
    }
    cursor.gap(4.0);

    cursor.line("CONFIRMED CONDITIONS:", 11.0, 20.0, &bold, 6.0);
    for condition in &claim.confirmed_conditions {
        cursor.line(&format!("  · {condition}"), 9.0, 25.0, &font, 4.5);
    }
    cursor.gap(4.0);

    cursor.line("ICD-10 CODES:", 11.0, 20.0, &bold, 6.0);
    for icd in &claim.selected_icd_codes {
        let text = format!("  {} — {} ({})", icd.code, icd.description, icd.condition);
        cursor.line(&text, 8.0, 25.0, &courier, 4.0);
    }
    cursor.gap(4.0);

    render_basket(&mut cursor, "DIAGNOSTIC BASKET:", &claim.diagnostic_treatments, &bold, &font, &courier);
    render_basket(
        &mut cursor,
        "ONGOING MANAGEMENT BASKET:",
        &claim.management_treatments,
        &bold,
        &font,
        &courier,
    );

    cursor.line("MEDICINES:", 11.0, 20.0, &bold, 6.0);
    for selection in &claim.medicine_selections {
        let med = &selection.medicine;
        let header = format!(
            "  {} — {} — {}",
            med.medicine_name, med.medicine_class, med.active_ingredient
        );
        cursor.line(&header, 8.0, 25.0, &courier, 4.0);

        let plan_name = selection
            .plan_type
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("No plan selected");
        let amounts = format!(
            "    CDA: R {:.2} (Core) / R {:.2} (Executive) — applicable R {:.2} — {}",
            med.cda_core,
            med.cda_executive,
            cda_for(med, selection.plan_type.as_ref()),
            plan_name,
        );
        cursor.line(&amounts, 8.0, 25.0, &courier, 4.0);

        if let Some(motivation) = selection.motivation.as_deref().filter(|m| !m.is_empty()) {
            for line in wrap_text(&format!("Motivation: {motivation}"), 80) {
                cursor.line(&format!("    {line}"), 8.0, 25.0, &font, 4.0);
            }
        }
        cursor.gap(2.0);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Write(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| ReportError::Write(e.to_string()))
}

fn render_basket(
    cursor: &mut PageCursor<'_>,
    heading: &str,
    treatments: &[TreatmentSelection],
    bold: &IndirectFontRef,
    font: &IndirectFontRef,
    courier: &IndirectFontRef,
) {
    cursor.line(heading, 11.0, 20.0, bold, 6.0);
    for selection in treatments {
        let t = &selection.treatment;
        let text = format!(
            "  {} ({}) — {} of {} units",
            t.procedure_name, t.procedure_code, selection.quantity, t.coverage_limit
        );
        cursor.line(&text, 8.0, 25.0, courier, 4.0);

        for evidence in &selection.evidence {
            let descriptor = match evidence.kind {
                EvidenceKind::Note => format!("    · note: {}", evidence.content),
                EvidenceKind::File => format!(
                    "    · file: {}",
                    evidence.file_name.as_deref().unwrap_or(&evidence.content)
                ),
            };
            for line in wrap_text(&descriptor, 85) {
                cursor.line(&line, 8.0, 25.0, font, 4.0);
            }
        }
    }
    cursor.gap(4.0);
}

/// Flowing write position; adds a continuation page at the bottom margin.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
}

impl PageCursor<'_> {
    fn line(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef, advance: f32) {
        if self.y < Mm(BOTTOM_MARGIN) {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = Mm(TOP_Y);
        }
        self.layer.use_text(text, size, Mm(x), self.y, font);
        self.y -= Mm(advance);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= Mm(mm);
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
