use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for a single verification request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerificationId(pub String);

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document value used when the extractor could not classify the document.
pub const UNKNOWN_DOCUMENT_TYPE: &str = "unknown";

/// Structured fields produced by the extraction collaborator.
///
/// Dates are normalized to `YYYY-MM-DD` by the extractor where it could parse them; anything
/// else is passed through verbatim and judged by the fraud rules. Absent fields are empty
/// strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedFields {
    pub name: String,
    pub dob: String,
    pub id_number: String,
    pub document_type: String,
    pub expiry_date: String,
    pub extraction_confidence: f64,
}

impl ExtractedFields {
    pub fn value(&self, field: RequiredField) -> &str {
        match field {
            RequiredField::Name => &self.name,
            RequiredField::Dob => &self.dob,
            RequiredField::IdNumber => &self.id_number,
        }
    }

    /// Required fields that are empty or blank, in declaration order.
    pub fn missing_required_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|field| self.value(*field).trim().is_empty())
            .collect()
    }

    pub fn document_type_resolved(&self) -> bool {
        let document_type = self.document_type.trim();
        !document_type.is_empty() && !document_type.eq_ignore_ascii_case(UNKNOWN_DOCUMENT_TYPE)
    }
}

/// Fields every identity document must yield for the verification to be meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Name,
    Dob,
    IdNumber,
}

impl RequiredField {
    pub const ALL: [RequiredField; 3] = [
        RequiredField::Name,
        RequiredField::Dob,
        RequiredField::IdNumber,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RequiredField::Name => "name",
            RequiredField::Dob => "dob",
            RequiredField::IdNumber => "id_number",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of the biometric collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BiometricResult {
    /// Face match confidence in `[0, 100]`; stays at 0 when no selfie was supplied.
    pub face_match_score: f64,
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub quality_issues: Vec<String>,
}

/// Raw image handed to the collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A single document/selfie pair submitted for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub verification_id: VerificationId,
    pub document: ImagePayload,
    pub selfie: Option<ImagePayload>,
}

impl VerificationRequest {
    /// The selfie when one was actually supplied; an empty payload counts as absent.
    pub fn selfie(&self) -> Option<&ImagePayload> {
        self.selfie.as_ref().filter(|selfie| !selfie.is_empty())
    }
}

/// Terminal classification of a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
    ManualReview,
    Error,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
            Decision::ManualReview => "manual_review",
            Decision::Error => "error",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// States a verification passes through inside the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStage {
    Started,
    FieldsExtracted,
    FraudChecked,
    AuthenticityChecked,
    BiometricCompared,
    Scored,
    Decided,
    Error,
}

impl VerificationStage {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStage::Started => "started",
            VerificationStage::FieldsExtracted => "fields_extracted",
            VerificationStage::FraudChecked => "fraud_checked",
            VerificationStage::AuthenticityChecked => "authenticity_checked",
            VerificationStage::BiometricCompared => "biometric_compared",
            VerificationStage::Scored => "scored",
            VerificationStage::Decided => "decided",
            VerificationStage::Error => "error",
        }
    }
}
