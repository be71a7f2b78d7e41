use async_trait::async_trait;

use super::collaborators::{NarrativeError, NarrativeGenerator, NarrativeRequest};

/// Deterministic summary used when the narrative collaborator cannot produce text.
pub fn fallback_summary(request: &NarrativeRequest<'_>) -> String {
    let document_type = if request.fields.document_type_resolved() {
        request.fields.document_type.trim()
    } else {
        "document"
    };

    format!(
        "KYC verification completed for {}. Trust score: {:.1}/100. Risk level: {} with {} fraud flags detected. Verification outcome: {}.",
        document_type,
        request.trust_score.value,
        request.fraud.risk_level,
        request.fraud.flags.len(),
        request.decision.label().to_ascii_uppercase(),
    )
}

/// Narrator that always renders the fallback template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

#[async_trait]
impl NarrativeGenerator for TemplateNarrator {
    async fn narrate(&self, request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
        Ok(fallback_summary(request))
    }
}
