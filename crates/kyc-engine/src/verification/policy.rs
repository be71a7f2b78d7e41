use serde::{Deserialize, Serialize};

use super::authenticity::AuthenticityAssessment;
use super::domain::{BiometricResult, Decision};
use super::fraud::{FraudAssessment, RiskLevel};

/// Cut-offs applied by the final decision policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Minimum face match score for approval. A verification without a selfie keeps the
    /// default score of 0 and is therefore rejected by this rule.
    pub face_match_threshold: f64,
    pub minimum_authenticity_confidence: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            face_match_threshold: 75.0,
            minimum_authenticity_confidence: 60.0,
        }
    }
}

/// Outcome of the decision policy for a fully evaluated request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolicyDecision {
    Approved,
    Rejected(RejectionReason),
}

impl PolicyDecision {
    pub fn decision(&self) -> Decision {
        match self {
            PolicyDecision::Approved => Decision::Approved,
            PolicyDecision::Rejected(_) => Decision::Rejected,
        }
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            PolicyDecision::Approved => None,
            PolicyDecision::Rejected(reason) => Some(reason),
        }
    }
}

/// Why a verification was rejected, recorded for audit trails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum RejectionReason {
    HighFraudRisk { flag_count: usize },
    DocumentNotAuthentic { confidence: f64 },
    FaceMatchBelowThreshold { score: f64, threshold: f64 },
}

impl RejectionReason {
    pub fn summary(&self) -> String {
        match self {
            RejectionReason::HighFraudRisk { flag_count } => {
                format!("rejected for high fraud risk ({flag_count} flag(s))")
            }
            RejectionReason::DocumentNotAuthentic { confidence } => format!(
                "rejected as document authenticity confidence {:.1} is too low",
                confidence
            ),
            RejectionReason::FaceMatchBelowThreshold { score, threshold } => format!(
                "rejected for face match {:.1} below required {:.1}",
                score, threshold
            ),
        }
    }
}

/// First matching rule wins: fraud risk or authenticity, then face match, then approve.
pub(crate) fn decide_outcome(
    config: &PolicyConfig,
    fraud: &FraudAssessment,
    authenticity: &AuthenticityAssessment,
    biometric: &BiometricResult,
) -> PolicyDecision {
    if fraud.risk_level == RiskLevel::High {
        return PolicyDecision::Rejected(RejectionReason::HighFraudRisk {
            flag_count: fraud.flags.len(),
        });
    }

    if !authenticity.authentic {
        return PolicyDecision::Rejected(RejectionReason::DocumentNotAuthentic {
            confidence: authenticity.confidence,
        });
    }

    if biometric.face_match_score < config.face_match_threshold {
        return PolicyDecision::Rejected(RejectionReason::FaceMatchBelowThreshold {
            score: biometric.face_match_score,
            threshold: config.face_match_threshold,
        });
    }

    PolicyDecision::Approved
}
