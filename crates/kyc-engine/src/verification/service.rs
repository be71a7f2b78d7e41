use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::collaborators::{BiometricMatcher, FieldExtractor, NarrativeGenerator};
use super::domain::{ImagePayload, VerificationId, VerificationRequest};
use super::orchestrator::VerificationOrchestrator;
use super::repository::{
    RepositoryError, VerificationRecord, VerificationRepository, VerificationStats,
};

/// Inbound document/selfie pair before an id has been assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationSubmission {
    pub verification_id: Option<VerificationId>,
    pub document: ImagePayload,
    pub selfie: Option<ImagePayload>,
}

/// Service composing the orchestrator with the verification repository.
pub struct VerificationService<E, B, N, R> {
    orchestrator: Arc<VerificationOrchestrator<E, B, N>>,
    repository: Arc<R>,
    sequence: AtomicU64,
}

impl<E, B, N, R> VerificationService<E, B, N, R>
where
    E: FieldExtractor + 'static,
    B: BiometricMatcher + 'static,
    N: NarrativeGenerator + 'static,
    R: VerificationRepository + 'static,
{
    pub fn new(orchestrator: Arc<VerificationOrchestrator<E, B, N>>, repository: Arc<R>) -> Self {
        Self {
            orchestrator,
            repository,
            sequence: AtomicU64::new(1),
        }
    }

    /// Skips sequence values already taken by caller-supplied ids.
    fn next_verification_id(&self) -> Result<VerificationId, RepositoryError> {
        loop {
            let id = self.sequence.fetch_add(1, Ordering::Relaxed);
            let candidate = VerificationId(format!("kyc-{id:06}"));
            if self.repository.fetch(&candidate)?.is_none() {
                return Ok(candidate);
            }
        }
    }

    /// Run a verification and persist its outcome, whatever the decision.
    pub async fn submit(
        &self,
        submission: VerificationSubmission,
    ) -> Result<VerificationRecord, VerificationServiceError> {
        let request = self.request_from(submission)?;
        let outcome = self.orchestrator.verify(&request).await;
        self.record(outcome)
    }

    /// Same as [`submit`](Self::submit) with a fixed evaluation date.
    pub async fn submit_on(
        &self,
        submission: VerificationSubmission,
        today: NaiveDate,
    ) -> Result<VerificationRecord, VerificationServiceError> {
        let request = self.request_from(submission)?;
        let outcome = self.orchestrator.verify_on(&request, today).await;
        self.record(outcome)
    }

    /// A taken id is refused here, before any collaborator is called.
    fn request_from(
        &self,
        submission: VerificationSubmission,
    ) -> Result<VerificationRequest, RepositoryError> {
        let verification_id = match submission.verification_id {
            Some(id) => {
                if self.repository.fetch(&id)?.is_some() {
                    warn!(verification_id = %id, "verification id already recorded");
                    return Err(RepositoryError::Conflict);
                }
                id
            }
            None => self.next_verification_id()?,
        };
        Ok(VerificationRequest {
            verification_id,
            document: submission.document,
            selfie: submission.selfie,
        })
    }

    fn record(
        &self,
        outcome: super::outcome::VerificationOutcome,
    ) -> Result<VerificationRecord, VerificationServiceError> {
        let record = VerificationRecord {
            outcome,
            recorded_at: Utc::now(),
        };
        let stored = self.repository.insert(record)?;
        info!(
            verification_id = %stored.verification_id(),
            decision = stored.outcome.decision.label(),
            "verification recorded"
        );
        Ok(stored)
    }

    /// Fetch a stored verification for status responses.
    pub fn get(
        &self,
        verification_id: &VerificationId,
    ) -> Result<VerificationRecord, VerificationServiceError> {
        let record = self
            .repository
            .fetch(verification_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn stats(&self) -> Result<VerificationStats, VerificationServiceError> {
        let records = self.repository.all()?;
        Ok(VerificationStats::from_records(&records))
    }
}

/// Error raised by the verification service.
#[derive(Debug, thiserror::Error)]
pub enum VerificationServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
