use async_trait::async_trait;
use chrono::NaiveDate;
use kyc_engine::config::CollaboratorConfig;
use kyc_engine::verification::{
    BiometricError, BiometricMatcher, BiometricResult, Decision, EncodedImage, ExtractedFields,
    ExtractionError, FieldExtractor, ImagePayload, NarrativeError, NarrativeGenerator,
    NarrativeRequest, RepositoryError, TemplateNarrator, VerificationId, VerificationRecord,
    VerificationRepository, VerificationService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApiVerificationService = VerificationService<
    ExtractorBackend,
    MatcherBackend,
    NarratorBackend,
    InMemoryVerificationRepository,
>;

#[derive(Default, Clone)]
pub(crate) struct InMemoryVerificationRepository {
    records: Arc<Mutex<HashMap<VerificationId, VerificationRecord>>>,
}

impl InMemoryVerificationRepository {
    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<VerificationId, VerificationRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl VerificationRepository for InMemoryVerificationRepository {
    fn insert(&self, record: VerificationRecord) -> Result<VerificationRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(record.verification_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.verification_id().clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &VerificationId) -> Result<Option<VerificationRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn by_decision(
        &self,
        decision: Decision,
        limit: usize,
    ) -> Result<Vec<VerificationRecord>, RepositoryError> {
        let guard = self.lock()?;
        let mut records: Vec<VerificationRecord> = guard
            .values()
            .filter(|record| record.outcome.decision == decision)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.recorded_at);
        records.truncate(limit);
        Ok(records)
    }

    fn all(&self) -> Result<Vec<VerificationRecord>, RepositoryError> {
        let guard = self.lock()?;
        let mut records: Vec<VerificationRecord> = guard.values().cloned().collect();
        records.sort_by_key(|record| record.recorded_at);
        Ok(records)
    }
}

fn http_client(timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "falling back to default http client");
            reqwest::Client::new()
        }
    }
}

/// Remote collaborator reached over JSON/HTTP.
#[derive(Clone)]
pub(crate) struct HttpEndpoint {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpEndpoint {
    pub(crate) fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            url: url.into(),
            timeout,
        }
    }

    async fn post<B, T>(&self, body: &B) -> Result<T, CallError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CallError::Rejected(format!("{status}: {detail}")));
        }
        if !status.is_success() {
            return Err(CallError::Unavailable(format!("{} returned {status}", self.url)));
        }

        response.json::<T>().await.map_err(|err| self.classify(err))
    }

    fn classify(&self, err: reqwest::Error) -> CallError {
        if err.is_timeout() {
            CallError::Timeout(self.timeout)
        } else if err.is_decode() {
            CallError::Rejected(format!("malformed response from {}: {err}", self.url))
        } else {
            CallError::Unavailable(format!("{}: {err}", self.url))
        }
    }
}

enum CallError {
    Rejected(String),
    Unavailable(String),
    Timeout(Duration),
}

#[derive(Serialize)]
struct ComparePayload {
    document: EncodedImage,
    selfie: EncodedImage,
}

#[derive(Serialize)]
struct NarrativePayload<'a> {
    extracted_fields: &'a ExtractedFields,
    trust_score: &'a kyc_engine::verification::TrustScore,
    fraud_assessment: &'a kyc_engine::verification::FraudAssessment,
    decision: Decision,
}

#[derive(Deserialize)]
struct NarrativeReply {
    #[serde(default)]
    summary: String,
}

/// Field extraction backend chosen at startup.
pub(crate) enum ExtractorBackend {
    Http(HttpEndpoint),
    /// Pre-extracted fields, used by the CLI.
    Fixed(ExtractedFields),
    Unconfigured,
}

#[async_trait]
impl FieldExtractor for ExtractorBackend {
    async fn extract(&self, document: &ImagePayload) -> Result<ExtractedFields, ExtractionError> {
        match self {
            ExtractorBackend::Http(endpoint) => endpoint
                .post(&EncodedImage::from_payload(document))
                .await
                .map_err(|err| match err {
                    CallError::Rejected(message) => ExtractionError::Unprocessable(message),
                    CallError::Unavailable(message) => ExtractionError::Unavailable(message),
                    CallError::Timeout(after) => ExtractionError::Timeout(after),
                }),
            ExtractorBackend::Fixed(fields) => Ok(fields.clone()),
            ExtractorBackend::Unconfigured => Err(ExtractionError::Unavailable(
                "KYC_EXTRACTION_URL is not configured".to_string(),
            )),
        }
    }
}

/// Face comparison backend chosen at startup.
pub(crate) enum MatcherBackend {
    Http(HttpEndpoint),
    /// Constant face match score, used by the CLI.
    Fixed(f64),
    Unconfigured,
}

#[async_trait]
impl BiometricMatcher for MatcherBackend {
    async fn compare(
        &self,
        document: &ImagePayload,
        selfie: &ImagePayload,
    ) -> Result<BiometricResult, BiometricError> {
        match self {
            MatcherBackend::Http(endpoint) => {
                let payload = ComparePayload {
                    document: EncodedImage::from_payload(document),
                    selfie: EncodedImage::from_payload(selfie),
                };
                endpoint.post(&payload).await.map_err(|err| match err {
                    CallError::Rejected(message) => BiometricError::NoFaceDetected(message),
                    CallError::Unavailable(message) => BiometricError::Unavailable(message),
                    CallError::Timeout(after) => BiometricError::Timeout(after),
                })
            }
            MatcherBackend::Fixed(score) => Ok(BiometricResult {
                face_match_score: *score,
                ..BiometricResult::default()
            }),
            MatcherBackend::Unconfigured => Err(BiometricError::Unavailable(
                "KYC_BIOMETRIC_URL is not configured".to_string(),
            )),
        }
    }
}

/// Narrative backend; without an endpoint the template is used directly.
pub(crate) enum NarratorBackend {
    Http(HttpEndpoint),
    Template(TemplateNarrator),
}

#[async_trait]
impl NarrativeGenerator for NarratorBackend {
    async fn narrate(&self, request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
        match self {
            NarratorBackend::Http(endpoint) => {
                let payload = NarrativePayload {
                    extracted_fields: request.fields,
                    trust_score: request.trust_score,
                    fraud_assessment: request.fraud,
                    decision: request.decision,
                };
                let reply: NarrativeReply =
                    endpoint.post(&payload).await.map_err(|err| match err {
                        CallError::Rejected(message) | CallError::Unavailable(message) => {
                            NarrativeError::Unavailable(message)
                        }
                        CallError::Timeout(after) => NarrativeError::Timeout(after),
                    })?;
                if reply.summary.trim().is_empty() {
                    return Err(NarrativeError::Empty);
                }
                Ok(reply.summary)
            }
            NarratorBackend::Template(template) => template.narrate(request).await,
        }
    }
}

/// Collaborators for `serve`, falling back to stand-ins where no URL is configured.
pub(crate) fn collaborators_from_config(
    config: &CollaboratorConfig,
) -> (ExtractorBackend, MatcherBackend, NarratorBackend) {
    let timeout = config.timeout();

    let extractor = match &config.extraction_url {
        Some(url) => ExtractorBackend::Http(HttpEndpoint::new(url, timeout)),
        None => {
            warn!("KYC_EXTRACTION_URL unset; every verification will end in error");
            ExtractorBackend::Unconfigured
        }
    };
    let matcher = match &config.biometric_url {
        Some(url) => MatcherBackend::Http(HttpEndpoint::new(url, timeout)),
        None => {
            warn!("KYC_BIOMETRIC_URL unset; requests with a selfie will end in error");
            MatcherBackend::Unconfigured
        }
    };
    let narrator = match &config.narrative_url {
        Some(url) => NarratorBackend::Http(HttpEndpoint::new(url, timeout)),
        None => NarratorBackend::Template(TemplateNarrator),
    };

    (extractor, matcher, narrator)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
