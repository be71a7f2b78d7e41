use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::collaborators::{BiometricMatcher, FieldExtractor, NarrativeGenerator};
use super::domain::VerificationId;
use super::payload::{VerifyRequestBody, MAX_IMAGE_BYTES};
use super::repository::{RepositoryError, VerificationRepository};
use super::service::{VerificationService, VerificationServiceError};

const MAX_REQUEST_BYTES: usize = MAX_IMAGE_BYTES / 3 * 4 * 2 + 64 * 1024;

/// Router builder exposing the verification, status and stats endpoints.
pub fn verification_router<E, B, N, R>(service: Arc<VerificationService<E, B, N, R>>) -> Router
where
    E: FieldExtractor + 'static,
    B: BiometricMatcher + 'static,
    N: NarrativeGenerator + 'static,
    R: VerificationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/kyc/verify",
            // Two base64 images at the per-image limit, plus the JSON envelope.
            post(verify_handler::<E, B, N, R>)
                .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES)),
        )
        .route(
            "/api/v1/kyc/verifications/:verification_id",
            get(status_handler::<E, B, N, R>),
        )
        .route("/api/v1/kyc/stats", get(stats_handler::<E, B, N, R>))
        .with_state(service)
}

pub(crate) async fn verify_handler<E, B, N, R>(
    State(service): State<Arc<VerificationService<E, B, N, R>>>,
    axum::Json(body): axum::Json<VerifyRequestBody>,
) -> Response
where
    E: FieldExtractor + 'static,
    B: BiometricMatcher + 'static,
    N: NarrativeGenerator + 'static,
    R: VerificationRepository + 'static,
{
    let submission = match body.into_submission() {
        Ok(submission) => submission,
        Err(err) => return error_response(err),
    };

    match service.submit(submission).await {
        // Every decision, Error included, answers 200.
        Ok(record) => (StatusCode::OK, axum::Json(record.outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<E, B, N, R>(
    State(service): State<Arc<VerificationService<E, B, N, R>>>,
    Path(verification_id): Path<String>,
) -> Response
where
    E: FieldExtractor + 'static,
    B: BiometricMatcher + 'static,
    N: NarrativeGenerator + 'static,
    R: VerificationRepository + 'static,
{
    let id = VerificationId(verification_id);
    match service.get(&id) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(VerificationServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "verification_id": id.0,
                "error": "verification not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn stats_handler<E, B, N, R>(
    State(service): State<Arc<VerificationService<E, B, N, R>>>,
) -> Response
where
    E: FieldExtractor + 'static,
    B: BiometricMatcher + 'static,
    N: NarrativeGenerator + 'static,
    R: VerificationRepository + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(error: VerificationServiceError) -> Response {
    let status = match &error {
        VerificationServiceError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        VerificationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        VerificationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        VerificationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
