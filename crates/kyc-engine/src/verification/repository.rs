use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Decision, VerificationId};
use super::outcome::VerificationOutcome;

/// Stored verification together with the time it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub outcome: VerificationOutcome,
    pub recorded_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn verification_id(&self) -> &VerificationId {
        &self.outcome.verification_id
    }

    pub fn status_view(&self) -> VerificationStatusView {
        VerificationStatusView {
            verification_id: self.outcome.verification_id.clone(),
            status: self.outcome.decision.label(),
            decision_rationale: self.outcome.rationale(),
            trust_score: self.outcome.trust_score_value(),
            summary: self.outcome.summary.clone(),
            recorded_at: self.recorded_at,
        }
    }
}

/// Storage abstraction so the service can be exercised without a database.
pub trait VerificationRepository: Send + Sync {
    fn insert(&self, record: VerificationRecord) -> Result<VerificationRecord, RepositoryError>;
    fn fetch(&self, id: &VerificationId) -> Result<Option<VerificationRecord>, RepositoryError>;
    fn by_decision(
        &self,
        decision: Decision,
        limit: usize,
    ) -> Result<Vec<VerificationRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<VerificationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Public representation of a stored verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationStatusView {
    pub verification_id: VerificationId,
    pub status: &'static str,
    pub decision_rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    pub summary: String,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate counters over stored verifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationStats {
    pub total_verifications: usize,
    pub approved: usize,
    pub rejected: usize,
    pub manual_review: usize,
    pub errored: usize,
    /// Mean over records that reached scoring.
    pub average_trust_score: f64,
    /// Approved share of all verifications, as a percentage.
    pub success_rate: f64,
}

impl VerificationStats {
    pub fn from_records(records: &[VerificationRecord]) -> Self {
        let mut stats = VerificationStats {
            total_verifications: records.len(),
            ..VerificationStats::default()
        };

        let mut scored = 0usize;
        let mut score_total = 0.0;
        for record in records {
            match record.outcome.decision {
                Decision::Approved => stats.approved += 1,
                Decision::Rejected => stats.rejected += 1,
                Decision::ManualReview => stats.manual_review += 1,
                Decision::Error => stats.errored += 1,
            }
            if let Some(value) = record.outcome.trust_score_value() {
                scored += 1;
                score_total += value;
            }
        }

        if scored > 0 {
            stats.average_trust_score = round_two_decimals(score_total / scored as f64);
        }
        if stats.total_verifications > 0 {
            stats.success_rate = round_two_decimals(
                stats.approved as f64 / stats.total_verifications as f64 * 100.0,
            );
        }

        stats
    }
}

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
