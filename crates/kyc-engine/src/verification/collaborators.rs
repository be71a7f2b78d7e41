//! Contracts for the external subsystems the engine depends on.
//!
//! Implementations own their transport, retries and timeouts; the orchestrator makes exactly one
//! call per stage and treats any error as a failure of that stage.

use std::time::Duration;

use async_trait::async_trait;

use super::domain::{BiometricResult, Decision, ExtractedFields, ImagePayload};
use super::fraud::FraudAssessment;
use super::scoring::TrustScore;

/// Turns a document image into structured fields.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, document: &ImagePayload) -> Result<ExtractedFields, ExtractionError>;
}

/// Compares the document portrait against the selfie.
#[async_trait]
pub trait BiometricMatcher: Send + Sync {
    async fn compare(
        &self,
        document: &ImagePayload,
        selfie: &ImagePayload,
    ) -> Result<BiometricResult, BiometricError>;
}

/// Produces a human-readable summary of a finished verification.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn narrate(&self, request: &NarrativeRequest<'_>) -> Result<String, NarrativeError>;
}

/// Everything a narrator may describe.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeRequest<'a> {
    pub fields: &'a ExtractedFields,
    pub trust_score: &'a TrustScore,
    pub fraud: &'a FraudAssessment,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("document could not be processed: {0}")]
    Unprocessable(String),
    #[error("extraction service unavailable: {0}")]
    Unavailable(String),
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BiometricError {
    #[error("no usable face found: {0}")]
    NoFaceDetected(String),
    #[error("biometric service unavailable: {0}")]
    Unavailable(String),
    #[error("face comparison timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NarrativeError {
    #[error("narrative service unavailable: {0}")]
    Unavailable(String),
    #[error("narrative generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("narrative service returned no text")]
    Empty,
}
