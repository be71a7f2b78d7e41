use crate::infra::{
    ApiVerificationService, ExtractorBackend, InMemoryVerificationRepository, MatcherBackend,
    NarratorBackend,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use kyc_engine::error::AppError;
use kyc_engine::verification::{
    ExtractedFields, ImagePayload, TemplateNarrator, VerificationConfig, VerificationId,
    VerificationOrchestrator, VerificationOutcome, VerificationRepository, VerificationService,
    VerificationServiceError, VerificationStats, VerificationSubmission,
};
use std::path::Path;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Extracted fields as inline JSON or a path to a JSON file
    #[arg(long)]
    pub(crate) fields: String,
    /// Face match score from an earlier comparison; omit when no selfie was taken
    #[arg(long)]
    pub(crate) face_score: Option<f64>,
    /// Evaluation date for age and expiry checks (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Identifier to stamp on the outcome
    #[arg(long, default_value = "cli-evaluation")]
    pub(crate) verification_id: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the evaluation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print each outcome as JSON in addition to the summary lines
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        fields,
        face_score,
        today,
        verification_id,
    } = args;

    let fields = load_fields(&fields)?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let repository = Arc::new(InMemoryVerificationRepository::default());
    let service = fixed_service(fields, face_score, repository);

    let record = service
        .submit_on(submission(&verification_id, face_score.is_some()), today)
        .await?;
    println!("{}", serde_json::to_string_pretty(&record.outcome)?);
    Ok(())
}

fn load_fields(raw: &str) -> Result<ExtractedFields, AppError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    let contents = std::fs::read_to_string(Path::new(trimmed))?;
    Ok(serde_json::from_str(&contents)?)
}

fn fixed_service(
    fields: ExtractedFields,
    face_score: Option<f64>,
    repository: Arc<InMemoryVerificationRepository>,
) -> ApiVerificationService {
    let matcher = match face_score {
        Some(score) => MatcherBackend::Fixed(score),
        None => MatcherBackend::Unconfigured,
    };
    service_with(ExtractorBackend::Fixed(fields), matcher, repository)
}

fn service_with(
    extractor: ExtractorBackend,
    matcher: MatcherBackend,
    repository: Arc<InMemoryVerificationRepository>,
) -> ApiVerificationService {
    let orchestrator = VerificationOrchestrator::new(
        Arc::new(extractor),
        Arc::new(matcher),
        Arc::new(NarratorBackend::Template(TemplateNarrator)),
        VerificationConfig::default(),
    );
    VerificationService::new(Arc::new(orchestrator), repository)
}

/// Placeholder images; the fixed collaborators never look at the bytes.
fn submission(id: &str, with_selfie: bool) -> VerificationSubmission {
    VerificationSubmission {
        verification_id: Some(VerificationId(id.to_string())),
        document: ImagePayload::new("image/jpeg", b"document".to_vec()),
        selfie: with_selfie.then(|| ImagePayload::new("image/jpeg", b"selfie".to_vec())),
    }
}

fn demo_passport() -> ExtractedFields {
    ExtractedFields {
        name: "John Doe".to_string(),
        dob: "1990-05-01".to_string(),
        id_number: "AB1234567".to_string(),
        document_type: "passport".to_string(),
        expiry_date: "2030-01-01".to_string(),
        extraction_confidence: 96.0,
    }
}

fn demo_specimen() -> ExtractedFields {
    ExtractedFields {
        name: "TEST".to_string(),
        dob: String::new(),
        id_number: "123456".to_string(),
        document_type: "passport".to_string(),
        expiry_date: "2030-01-01".to_string(),
        extraction_confidence: 40.0,
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { today, json } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let repository = Arc::new(InMemoryVerificationRepository::default());

    println!("KYC verification demo (evaluated {today})");

    let scenarios = [
        (
            "demo-approved",
            "Legible passport with a matching selfie",
            ExtractorBackend::Fixed(demo_passport()),
            MatcherBackend::Fixed(97.0),
            true,
        ),
        (
            "demo-specimen",
            "Specimen card with a missing birth date",
            ExtractorBackend::Fixed(demo_specimen()),
            MatcherBackend::Fixed(97.0),
            true,
        ),
        (
            "demo-no-selfie",
            "Legible passport without a selfie",
            ExtractorBackend::Fixed(demo_passport()),
            MatcherBackend::Unconfigured,
            false,
        ),
        (
            "demo-extraction-down",
            "Extraction service unreachable",
            ExtractorBackend::Unconfigured,
            MatcherBackend::Fixed(97.0),
            true,
        ),
    ];

    for (id, title, extractor, matcher, with_selfie) in scenarios {
        let service = service_with(extractor, matcher, repository.clone());
        let record = service.submit_on(submission(id, with_selfie), today).await?;
        render_outcome(title, &record.outcome);
        if json {
            println!("{}", serde_json::to_string_pretty(&record.outcome)?);
        }
    }

    let records = repository.all().map_err(VerificationServiceError::from)?;
    render_stats(&VerificationStats::from_records(&records));
    Ok(())
}

fn render_outcome(title: &str, outcome: &VerificationOutcome) {
    println!("\n{title}");
    println!(
        "- {} -> {}",
        outcome.verification_id,
        outcome.decision.label().to_ascii_uppercase()
    );
    match outcome.trust_score.as_ref() {
        Some(score) => println!(
            "  Trust score: {:.1} ({:?}, score alone suggests {:?})",
            score.value, score.band, score.recommendation
        ),
        None => println!("  Trust score: not computed"),
    }
    if let Some(fraud) = outcome.fraud_assessment.as_ref() {
        println!("  {}", fraud.summary());
        for flag in &fraud.flags {
            println!("    - {flag}");
        }
    }
    println!("  Rationale: {}", outcome.rationale());
    println!("  Summary: {}", outcome.summary);
}

fn render_stats(stats: &VerificationStats) {
    println!("\nTotals");
    println!(
        "- {} verifications | {} approved | {} rejected | {} manual review | {} errored",
        stats.total_verifications,
        stats.approved,
        stats.rejected,
        stats.manual_review,
        stats.errored
    );
    println!(
        "- average trust score {:.2} | success rate {:.2}%",
        stats.average_trust_score, stats.success_rate
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_engine::verification::Decision;

    fn evaluation_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
    }

    #[test]
    fn load_fields_accepts_inline_json() {
        let fields = load_fields(r#" {"name": "Jane Roe", "extraction_confidence": 91.5} "#)
            .expect("inline json parses");
        assert_eq!(fields.name, "Jane Roe");
        assert_eq!(fields.dob, "");
        assert_eq!(fields.extraction_confidence, 91.5);
    }

    #[test]
    fn load_fields_reports_missing_file() {
        let err = load_fields("does/not/exist.json").expect_err("missing file");
        assert!(matches!(err, AppError::Io(_)));
    }

    #[tokio::test]
    async fn fixed_service_without_face_score_is_rejected() {
        let repository = Arc::new(InMemoryVerificationRepository::default());
        let service = fixed_service(demo_passport(), None, repository);

        let record = service
            .submit_on(submission("cli-1", false), evaluation_date())
            .await
            .expect("evaluates");

        assert_eq!(record.outcome.decision, Decision::Rejected);
        assert_eq!(record.outcome.trust_score_value(), Some(65.0));
    }

    #[tokio::test]
    async fn fixed_service_with_face_score_is_approved() {
        let repository = Arc::new(InMemoryVerificationRepository::default());
        let service = fixed_service(demo_passport(), Some(97.0), repository);

        let record = service
            .submit_on(submission("cli-2", true), evaluation_date())
            .await
            .expect("evaluates");

        assert_eq!(record.outcome.decision, Decision::Approved);
        assert_eq!(record.outcome.trust_score_value(), Some(100.0));
    }

    #[tokio::test]
    async fn demo_runs_every_scenario() {
        run_demo(DemoArgs {
            today: Some(evaluation_date()),
            json: false,
        })
        .await
        .expect("demo completes");
    }
}
