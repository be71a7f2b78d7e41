use super::super::domain::ExtractedFields;
use super::super::fraud::{FraudAssessment, RiskLevel};

/// Step thresholds shared by the face and document-quality scores, highest first.
struct StepScale {
    steps: [(f64, f64); 4],
    /// Below the last step the score scales linearly from 0 up to this input value.
    linear_ceiling: f64,
    linear_score: f64,
}

impl StepScale {
    fn apply(&self, input: f64) -> f64 {
        self.steps
            .iter()
            .find(|(threshold, _)| input >= *threshold)
            .map(|(_, score)| *score)
            .unwrap_or_else(|| (input / self.linear_ceiling * self.linear_score).max(0.0))
    }
}

const FACE_SCALE: StepScale = StepScale {
    steps: [(95.0, 100.0), (85.0, 90.0), (75.0, 70.0), (60.0, 50.0)],
    linear_ceiling: 60.0,
    linear_score: 50.0,
};

const DOCUMENT_SCALE: StepScale = StepScale {
    steps: [(95.0, 100.0), (85.0, 90.0), (70.0, 70.0), (50.0, 50.0)],
    linear_ceiling: 50.0,
    linear_score: 50.0,
};

const MISSING_FIELD_DEDUCTION: f64 = 25.0;
const RESOLVED_DOCUMENT_BONUS: f64 = 5.0;
const HIGH_RISK_FLAG_DEDUCTION: f64 = 10.0;
const EXCESS_FLAG_ALLOWANCE: usize = 5;
const EXCESS_FLAG_DEDUCTION: f64 = 5.0;

pub(crate) fn face_score(face_match_score: f64) -> f64 {
    FACE_SCALE.apply(face_match_score)
}

pub(crate) fn document_quality_score(fields: &ExtractedFields) -> f64 {
    let mut score = DOCUMENT_SCALE.apply(fields.extraction_confidence);
    score -= MISSING_FIELD_DEDUCTION * fields.missing_required_fields().len() as f64;
    if fields.document_type_resolved() {
        score += RESOLVED_DOCUMENT_BONUS;
    }
    score.clamp(0.0, 100.0)
}

pub(crate) fn fraud_score(fraud: &FraudAssessment) -> f64 {
    if !fraud.has_fraud_indicators() {
        return 100.0;
    }

    let base = match fraud.risk_level {
        RiskLevel::Low => 80.0,
        RiskLevel::Medium => 50.0,
        RiskLevel::High => 20.0,
    };
    let high_risk = HIGH_RISK_FLAG_DEDUCTION * fraud.high_risk_flag_count() as f64;
    let excess = EXCESS_FLAG_DEDUCTION
        * fraud.flags.len().saturating_sub(EXCESS_FLAG_ALLOWANCE) as f64;

    (base - high_risk - excess).max(0.0)
}

/// `100 - n * (100 / max(n, 1))`: exactly 0 for any non-zero issue count, 100 otherwise.
pub(crate) fn consistency_score(fraud: &FraudAssessment) -> f64 {
    let issues = fraud.consistency_issue_count() as f64;
    let deduction_per_issue = 100.0 / issues.max(1.0);
    (100.0 - issues * deduction_per_issue).max(0.0)
}
