use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::authenticity::AuthenticityAssessment;
use super::domain::{BiometricResult, Decision, ExtractedFields, VerificationId, VerificationStage};
use super::fraud::FraudAssessment;
use super::policy::RejectionReason;
use super::scoring::TrustScore;

/// Final, immutable result of one verification request.
///
/// Stages that never ran leave their slot empty, so an `Error` outcome carries exactly the
/// partial results computed before the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verification_id: VerificationId,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionReason>,
    pub evaluated_on: NaiveDate,
    pub extracted_fields: Option<ExtractedFields>,
    pub fraud_assessment: Option<FraudAssessment>,
    pub authenticity: Option<AuthenticityAssessment>,
    pub biometric: BiometricResult,
    pub trust_score: Option<TrustScore>,
    pub summary: String,
    pub stages: Vec<VerificationStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureCause>,
}

impl VerificationOutcome {
    pub fn trust_score_value(&self) -> Option<f64> {
        self.trust_score.as_ref().map(|score| score.value)
    }

    pub fn final_stage(&self) -> VerificationStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(VerificationStage::Started)
    }

    pub fn rationale(&self) -> String {
        match (&self.decision, &self.rejection, &self.error) {
            (Decision::Error, _, Some(cause)) => format!("verification failed: {cause}"),
            (_, Some(reason), _) => reason.summary(),
            (Decision::Approved, _, _) => "verification approved".to_string(),
            (Decision::ManualReview, _, _) => "requires manual review".to_string(),
            (decision, _, _) => decision.label().to_string(),
        }
    }
}

/// Which collaborator or invariant broke the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Extraction,
    Biometric,
    Scoring,
}

impl FailureKind {
    pub const fn label(self) -> &'static str {
        match self {
            FailureKind::Extraction => "extraction_failure",
            FailureKind::Biometric => "biometric_failure",
            FailureKind::Scoring => "scoring_error",
        }
    }
}

/// Audit record for an `Error` outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub kind: FailureKind,
    /// Last stage completed before the failure.
    pub stage: VerificationStage,
    pub message: String,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {}: {}",
            self.kind.label(),
            self.stage.label(),
            self.message
        )
    }
}
