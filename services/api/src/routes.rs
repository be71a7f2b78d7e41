use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use kyc_engine::verification::{
    verification_router, BiometricMatcher, FieldExtractor, NarrativeGenerator,
    VerificationRepository, VerificationService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_verification_routes<E, B, N, R>(
    service: Arc<VerificationService<E, B, N, R>>,
) -> axum::Router
where
    E: FieldExtractor + 'static,
    B: BiometricMatcher + 'static,
    N: NarrativeGenerator + 'static,
    R: VerificationRepository + 'static,
{
    verification_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "kyc-engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Acquire);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        ExtractorBackend, InMemoryVerificationRepository, MatcherBackend, NarratorBackend,
    };
    use kyc_engine::verification::{
        TemplateNarrator, VerificationConfig, VerificationOrchestrator,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn router(ready: bool) -> axum::Router {
        let orchestrator = VerificationOrchestrator::new(
            Arc::new(ExtractorBackend::Unconfigured),
            Arc::new(MatcherBackend::Unconfigured),
            Arc::new(NarratorBackend::Template(TemplateNarrator)),
            VerificationConfig::default(),
        );
        let service = Arc::new(VerificationService::new(
            Arc::new(orchestrator),
            Arc::new(InMemoryVerificationRepository::default()),
        ));
        with_verification_routes(service).layer(Extension(app_state(ready)))
    }

    fn get(uri: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::get(uri)
            .body(axum::body::Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let response = router(false).oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = router(true).oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn stats_route_is_mounted() {
        let response = router(true).oneshot(get("/api/v1/kyc/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
