use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use super::authenticity::{assess_authenticity, AuthenticityAssessment};
use super::collaborators::{
    BiometricMatcher, FieldExtractor, NarrativeError, NarrativeGenerator, NarrativeRequest,
};
use super::config::VerificationConfig;
use super::domain::{
    BiometricResult, Decision, ExtractedFields, VerificationId, VerificationRequest,
    VerificationStage,
};
use super::fraud::{FraudAssessment, FraudRuleEngine};
use super::narrative::fallback_summary;
use super::outcome::{FailureCause, FailureKind, VerificationOutcome};
use super::policy::{decide_outcome, RejectionReason};
use super::scoring::{TrustScore, TrustScoreCalculator};

/// Sequences extraction, rule evaluation, biometric comparison, scoring and the final decision.
///
/// Holds no per-request state; one instance can serve any number of concurrent requests.
pub struct VerificationOrchestrator<E, B, N> {
    extractor: Arc<E>,
    matcher: Arc<B>,
    narrator: Arc<N>,
    fraud_engine: FraudRuleEngine,
    calculator: TrustScoreCalculator,
    config: VerificationConfig,
}

impl<E, B, N> VerificationOrchestrator<E, B, N>
where
    E: FieldExtractor + 'static,
    B: BiometricMatcher + 'static,
    N: NarrativeGenerator + 'static,
{
    pub fn new(
        extractor: Arc<E>,
        matcher: Arc<B>,
        narrator: Arc<N>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            extractor,
            matcher,
            narrator,
            fraud_engine: FraudRuleEngine::new(config.fraud.clone()),
            calculator: TrustScoreCalculator::new(),
            config,
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Run the pipeline as of today's local date.
    pub async fn verify(&self, request: &VerificationRequest) -> VerificationOutcome {
        self.verify_on(request, Local::now().date_naive()).await
    }

    /// Run the pipeline with `today` anchoring age and expiry checks.
    ///
    /// Never fails: collaborator errors become an outcome with `Decision::Error`.
    pub async fn verify_on(
        &self,
        request: &VerificationRequest,
        today: NaiveDate,
    ) -> VerificationOutcome {
        let mut run = PipelineRun::start(request.verification_id.clone(), today);
        info!(verification_id = %run.verification_id, "verification started");

        let fields = match self.extractor.extract(&request.document).await {
            Ok(fields) => fields,
            Err(err) => return run.fail(FailureKind::Extraction, err.to_string()),
        };
        run.fields = Some(fields.clone());
        run.advance(VerificationStage::FieldsExtracted);

        let fraud = self.fraud_engine.evaluate_on(&fields, today);
        run.fraud = Some(fraud.clone());
        run.advance(VerificationStage::FraudChecked);

        let authenticity =
            assess_authenticity(&fields, self.config.policy.minimum_authenticity_confidence);
        run.authenticity = Some(authenticity.clone());
        run.advance(VerificationStage::AuthenticityChecked);

        if let Some(selfie) = request.selfie() {
            match self.matcher.compare(&request.document, selfie).await {
                Ok(biometric) => {
                    run.biometric = biometric;
                    run.advance(VerificationStage::BiometricCompared);
                }
                Err(err) => return run.fail(FailureKind::Biometric, err.to_string()),
            }
        }
        let biometric = run.biometric.clone();

        let trust_score = match self.calculator.score(&biometric, &fields, &fraud) {
            Ok(score) => score,
            Err(err) => return run.fail(FailureKind::Scoring, err.to_string()),
        };
        run.trust_score = Some(trust_score.clone());
        run.advance(VerificationStage::Scored);

        let policy = decide_outcome(&self.config.policy, &fraud, &authenticity, &biometric);
        let decision = policy.decision();
        run.advance(VerificationStage::Decided);

        let summary = self
            .narrate(&run.verification_id, &fields, &trust_score, &fraud, decision)
            .await;

        info!(
            verification_id = %run.verification_id,
            decision = decision.label(),
            trust_score = trust_score.value,
            risk_level = fraud.risk_level.label(),
            "verification decided"
        );

        run.finish(decision, policy.rejection().cloned(), summary)
    }

    async fn narrate(
        &self,
        verification_id: &VerificationId,
        fields: &ExtractedFields,
        trust_score: &TrustScore,
        fraud: &FraudAssessment,
        decision: Decision,
    ) -> String {
        let request = NarrativeRequest {
            fields,
            trust_score,
            fraud,
            decision,
        };
        let timeout = self.config.narrative_timeout();

        let result = match tokio::time::timeout(timeout, self.narrator.narrate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(NarrativeError::Timeout(timeout)),
        };

        let err = match result {
            Ok(text) if !text.trim().is_empty() => return text,
            Ok(_) => NarrativeError::Empty,
            Err(err) => err,
        };
        warn!(%verification_id, error = %err, "using fallback narrative");
        fallback_summary(&request)
    }
}

/// Partial results accumulated while a request moves through the stages.
struct PipelineRun {
    verification_id: VerificationId,
    today: NaiveDate,
    stages: Vec<VerificationStage>,
    fields: Option<ExtractedFields>,
    fraud: Option<FraudAssessment>,
    authenticity: Option<AuthenticityAssessment>,
    biometric: BiometricResult,
    trust_score: Option<TrustScore>,
}

impl PipelineRun {
    fn start(verification_id: VerificationId, today: NaiveDate) -> Self {
        Self {
            verification_id,
            today,
            stages: vec![VerificationStage::Started],
            fields: None,
            fraud: None,
            authenticity: None,
            biometric: BiometricResult::default(),
            trust_score: None,
        }
    }

    fn advance(&mut self, stage: VerificationStage) {
        self.stages.push(stage);
    }

    fn last_stage(&self) -> VerificationStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(VerificationStage::Started)
    }

    fn fail(mut self, kind: FailureKind, message: String) -> VerificationOutcome {
        let cause = FailureCause {
            kind,
            stage: self.last_stage(),
            message,
        };
        error!(
            verification_id = %self.verification_id,
            kind = kind.label(),
            stage = cause.stage.label(),
            error = %cause.message,
            "verification pipeline aborted"
        );
        self.advance(VerificationStage::Error);

        let summary = format!("Verification could not be completed: {cause}");
        self.into_outcome(Decision::Error, None, summary, Some(cause))
    }

    fn finish(
        self,
        decision: Decision,
        rejection: Option<RejectionReason>,
        summary: String,
    ) -> VerificationOutcome {
        self.into_outcome(decision, rejection, summary, None)
    }

    fn into_outcome(
        self,
        decision: Decision,
        rejection: Option<RejectionReason>,
        summary: String,
        error: Option<FailureCause>,
    ) -> VerificationOutcome {
        VerificationOutcome {
            verification_id: self.verification_id,
            decision,
            rejection,
            evaluated_on: self.today,
            extracted_fields: self.fields,
            fraud_assessment: self.fraud,
            authenticity: self.authenticity,
            biometric: self.biometric,
            trust_score: self.trust_score,
            summary,
            stages: self.stages,
            error,
        }
    }
}
