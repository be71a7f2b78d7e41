//! KYC verification: document fraud rules, trust scoring and the decision pipeline.
//!
//! Extraction, face comparison and narrative text are delegated to collaborators behind the
//! traits in [`collaborators`]; everything else here is deterministic and synchronous.

pub mod authenticity;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod fraud;
pub mod narrative;
pub mod orchestrator;
pub mod outcome;
pub mod payload;
pub(crate) mod policy;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use authenticity::{assess_authenticity, AuthenticityAssessment};
pub use collaborators::{
    BiometricError, BiometricMatcher, ExtractionError, FieldExtractor, NarrativeError,
    NarrativeGenerator, NarrativeRequest,
};
pub use config::VerificationConfig;
pub use domain::{
    BiometricResult, Decision, ExtractedFields, ImagePayload, RequiredField, VerificationId,
    VerificationRequest, VerificationStage, UNKNOWN_DOCUMENT_TYPE,
};
pub use fraud::{
    ConsistencyIssue, FraudAssessment, FraudCheckDetails, FraudFlag, FraudRuleConfig,
    FraudRuleEngine, RiskLevel,
};
pub use narrative::{fallback_summary, TemplateNarrator};
pub use orchestrator::VerificationOrchestrator;
pub use outcome::{FailureCause, FailureKind, VerificationOutcome};
pub use payload::{decode_base64_any, EncodedImage, VerifyRequestBody};
pub use policy::{PolicyConfig, PolicyDecision, RejectionReason};
pub use repository::{
    RepositoryError, VerificationRecord, VerificationRepository, VerificationStats,
    VerificationStatusView,
};
pub use router::verification_router;
pub use scoring::{
    ComponentScores, Recommendation, ScoreWeights, ScoringError, TrustBand, TrustScore,
    TrustScoreCalculator, WeightedContributions,
};
pub use service::{VerificationService, VerificationServiceError, VerificationSubmission};
