use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::verification::collaborators::{
    BiometricError, BiometricMatcher, ExtractionError, FieldExtractor, NarrativeError,
    NarrativeGenerator, NarrativeRequest,
};
use crate::verification::domain::{
    BiometricResult, Decision, ExtractedFields, ImagePayload, VerificationId, VerificationRequest,
};
use crate::verification::repository::{
    RepositoryError, VerificationRecord, VerificationRepository,
};
use crate::verification::{
    verification_router, VerificationConfig, VerificationOrchestrator, VerificationService,
};

pub(super) fn evaluation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

/// Fully legible passport for a 35 year old.
pub(super) fn clean_fields() -> ExtractedFields {
    ExtractedFields {
        name: "John Doe".to_string(),
        dob: "1990-05-01".to_string(),
        id_number: "AB1234567".to_string(),
        document_type: "passport".to_string(),
        expiry_date: "2030-01-01".to_string(),
        extraction_confidence: 96.0,
    }
}

/// Placeholder specimen card with the birth date torn off.
pub(super) fn specimen_fields() -> ExtractedFields {
    ExtractedFields {
        name: "TEST".to_string(),
        dob: String::new(),
        id_number: "123456".to_string(),
        document_type: "passport".to_string(),
        expiry_date: "2030-01-01".to_string(),
        extraction_confidence: 40.0,
    }
}

pub(super) fn document() -> ImagePayload {
    ImagePayload::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01])
}

pub(super) fn selfie() -> ImagePayload {
    ImagePayload::new("image/png", vec![0x89, 0x50, 0x4E, 0x47, 0x02])
}

pub(super) fn request(id: &str, with_selfie: bool) -> VerificationRequest {
    VerificationRequest {
        verification_id: VerificationId(id.to_string()),
        document: document(),
        selfie: with_selfie.then(selfie),
    }
}

pub(super) fn face(score: f64) -> BiometricResult {
    BiometricResult {
        face_match_score: score,
        ..BiometricResult::default()
    }
}

pub(super) fn fast_narrative_config() -> VerificationConfig {
    VerificationConfig {
        narrative_timeout_ms: 50,
        ..VerificationConfig::default()
    }
}

pub(super) fn orchestrator<E, B, N>(
    extractor: E,
    matcher: B,
    narrator: N,
) -> VerificationOrchestrator<E, B, N>
where
    E: FieldExtractor + 'static,
    B: BiometricMatcher + 'static,
    N: NarrativeGenerator + 'static,
{
    VerificationOrchestrator::new(
        Arc::new(extractor),
        Arc::new(matcher),
        Arc::new(narrator),
        fast_narrative_config(),
    )
}

pub(super) type StaticService =
    VerificationService<StaticExtractor, StaticMatcher, FixedNarrator, MemoryRepository>;

pub(super) fn build_service(
    fields: ExtractedFields,
    face_score: f64,
) -> (StaticService, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let orchestrator = Arc::new(orchestrator(
        StaticExtractor::new(fields),
        StaticMatcher::new(face_score),
        FixedNarrator::new("Narrated summary."),
    ));
    let service = VerificationService::new(orchestrator, repository.clone());
    (service, repository)
}

pub(super) fn verification_router_with_service(service: StaticService) -> axum::Router {
    verification_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct StaticExtractor {
    fields: ExtractedFields,
    calls: AtomicUsize,
}

impl StaticExtractor {
    pub(super) fn new(fields: ExtractedFields) -> Self {
        Self {
            fields,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FieldExtractor for StaticExtractor {
    async fn extract(&self, _document: &ImagePayload) -> Result<ExtractedFields, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fields.clone())
    }
}

pub(super) struct FailingExtractor;

#[async_trait]
impl FieldExtractor for FailingExtractor {
    async fn extract(&self, _document: &ImagePayload) -> Result<ExtractedFields, ExtractionError> {
        Err(ExtractionError::Unavailable("ocr backend offline".to_string()))
    }
}

pub(super) struct StaticMatcher {
    score: f64,
    calls: AtomicUsize,
}

impl StaticMatcher {
    pub(super) fn new(score: f64) -> Self {
        Self {
            score,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BiometricMatcher for StaticMatcher {
    async fn compare(
        &self,
        _document: &ImagePayload,
        _selfie: &ImagePayload,
    ) -> Result<BiometricResult, BiometricError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(face(self.score))
    }
}

pub(super) struct FailingMatcher;

#[async_trait]
impl BiometricMatcher for FailingMatcher {
    async fn compare(
        &self,
        _document: &ImagePayload,
        _selfie: &ImagePayload,
    ) -> Result<BiometricResult, BiometricError> {
        Err(BiometricError::NoFaceDetected("selfie".to_string()))
    }
}

pub(super) struct FixedNarrator {
    text: String,
    calls: AtomicUsize,
}

impl FixedNarrator {
    pub(super) fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeGenerator for FixedNarrator {
    async fn narrate(&self, _request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

pub(super) struct FailingNarrator;

#[async_trait]
impl NarrativeGenerator for FailingNarrator {
    async fn narrate(&self, _request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unavailable("model quota exhausted".to_string()))
    }
}

pub(super) struct SlowNarrator(pub(super) Duration);

#[async_trait]
impl NarrativeGenerator for SlowNarrator {
    async fn narrate(&self, _request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
        tokio::time::sleep(self.0).await;
        Ok("too late".to_string())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<VerificationId, VerificationRecord>>>,
}

impl VerificationRepository for MemoryRepository {
    fn insert(&self, record: VerificationRecord) -> Result<VerificationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(record.verification_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.verification_id().clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &VerificationId) -> Result<Option<VerificationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn by_decision(
        &self,
        decision: Decision,
        limit: usize,
    ) -> Result<Vec<VerificationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.outcome.decision == decision)
            .take(limit)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<VerificationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(super) struct UnavailableRepository;

impl VerificationRepository for UnavailableRepository {
    fn insert(&self, _record: VerificationRecord) -> Result<VerificationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &VerificationId) -> Result<Option<VerificationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_decision(
        &self,
        _decision: Decision,
        _limit: usize,
    ) -> Result<Vec<VerificationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<VerificationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
