use serde::{Deserialize, Serialize};

use super::domain::ExtractedFields;

const FULL_CONFIDENCE: f64 = 100.0;
const LOW_EXTRACTION_QUALITY: f64 = 70.0;
const LOW_EXTRACTION_PENALTY: f64 = 20.0;
const MISSING_FIELD_PENALTY: f64 = 15.0;
const UNKNOWN_DOCUMENT_PENALTY: f64 = 10.0;

/// Whether the document looks genuine, judged from extraction quality and completeness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticityAssessment {
    pub authentic: bool,
    pub confidence: f64,
    pub issues: Vec<String>,
}

/// Derive the authenticity assessment; `minimum_confidence` is the authentic/not-authentic cut.
pub fn assess_authenticity(
    fields: &ExtractedFields,
    minimum_confidence: f64,
) -> AuthenticityAssessment {
    let mut confidence = FULL_CONFIDENCE;
    let mut issues = Vec::new();

    if fields.extraction_confidence < LOW_EXTRACTION_QUALITY {
        issues.push(
            "Low text extraction quality - possible poor image or tampered document".to_string(),
        );
        confidence -= LOW_EXTRACTION_PENALTY;
    }

    let missing = fields.missing_required_fields();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|field| field.label()).collect();
        issues.push(format!(
            "Failed to extract critical fields: {}",
            names.join(", ")
        ));
        confidence -= MISSING_FIELD_PENALTY * missing.len() as f64;
    }

    if !fields.document_type_resolved() {
        issues.push("Document type could not be identified".to_string());
        confidence -= UNKNOWN_DOCUMENT_PENALTY;
    }

    AuthenticityAssessment {
        authentic: confidence >= minimum_confidence,
        confidence: confidence.max(0.0),
        issues,
    }
}
