use crate::cli::ServeArgs;
use crate::infra::{collaborators_from_config, AppState, InMemoryVerificationRepository};
use crate::routes::with_verification_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kyc_engine::config::AppConfig;
use kyc_engine::error::AppError;
use kyc_engine::telemetry;
use kyc_engine::verification::{VerificationOrchestrator, VerificationService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (extractor, matcher, narrator) = collaborators_from_config(&config.collaborators);
    let orchestrator = Arc::new(VerificationOrchestrator::new(
        Arc::new(extractor),
        Arc::new(matcher),
        Arc::new(narrator),
        config.verification.clone(),
    ));
    let repository = Arc::new(InMemoryVerificationRepository::default());
    let verification_service = Arc::new(VerificationService::new(orchestrator, repository));

    let app = with_verification_routes(verification_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        face_match_threshold = config.verification.policy.face_match_threshold,
        "kyc verification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
