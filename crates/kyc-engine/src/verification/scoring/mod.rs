mod components;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{BiometricResult, ExtractedFields};
use super::fraud::FraudAssessment;

/// Fixed component weights; they always sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub face: u8,
    pub document_quality: u8,
    pub fraud: u8,
    pub consistency: u8,
}

impl ScoreWeights {
    pub const STANDARD: ScoreWeights = ScoreWeights {
        face: 35,
        document_quality: 25,
        fraud: 30,
        consistency: 10,
    };

    pub const fn total(&self) -> u16 {
        self.face as u16
            + self.document_quality as u16
            + self.fraud as u16
            + self.consistency as u16
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Per-component scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub face: f64,
    pub document_quality: f64,
    pub fraud: f64,
    pub consistency: f64,
}

impl ComponentScores {
    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("face", self.face),
            ("document_quality", self.document_quality),
            ("fraud", self.fraud),
            ("consistency", self.consistency),
        ]
    }
}

/// Each component's share of the composite, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedContributions {
    pub face: f64,
    pub document_quality: f64,
    pub fraud: f64,
    pub consistency: f64,
}

/// Advisory banding of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustBand {
    LowRisk,
    MediumRisk,
    HighRisk,
}

impl TrustBand {
    pub fn for_score(value: f64) -> Self {
        if value >= 80.0 {
            TrustBand::LowRisk
        } else if value >= 60.0 {
            TrustBand::MediumRisk
        } else {
            TrustBand::HighRisk
        }
    }

    pub const fn recommendation(self) -> Recommendation {
        match self {
            TrustBand::LowRisk => Recommendation::Approve,
            TrustBand::MediumRisk => Recommendation::ManualReview,
            TrustBand::HighRisk => Recommendation::Reject,
        }
    }
}

/// What the score alone would suggest; the decision policy has the final say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    ManualReview,
    Reject,
}

/// Composite trust score with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScore {
    pub value: f64,
    pub components: ComponentScores,
    pub weights: ScoreWeights,
    pub contributions: WeightedContributions,
    pub band: TrustBand,
    pub recommendation: Recommendation,
}

/// Raised only when an input or intermediate value breaks the scoring invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("{input} is not a finite number")]
    NonFiniteInput { input: &'static str },
    #[error("{component} component score {value} outside [0, 100]")]
    ComponentOutOfRange { component: &'static str, value: f64 },
}

/// Stateless calculator combining the component scores with the standard weights.
#[derive(Debug, Clone, Default)]
pub struct TrustScoreCalculator {
    weights: ScoreWeights,
}

impl TrustScoreCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    pub fn score(
        &self,
        face: &BiometricResult,
        fields: &ExtractedFields,
        fraud: &FraudAssessment,
    ) -> Result<TrustScore, ScoringError> {
        ensure_finite("face_match_score", face.face_match_score)?;
        ensure_finite("extraction_confidence", fields.extraction_confidence)?;

        let components = ComponentScores {
            face: components::face_score(face.face_match_score),
            document_quality: components::document_quality_score(fields),
            fraud: components::fraud_score(fraud),
            consistency: components::consistency_score(fraud),
        };

        for (component, value) in components.entries() {
            if !(0.0..=100.0).contains(&value) {
                return Err(ScoringError::ComponentOutOfRange { component, value });
            }
        }

        let weights = self.weights;
        let weighted = |score: f64, weight: u8| score * f64::from(weight);
        let total = weighted(components.face, weights.face)
            + weighted(components.document_quality, weights.document_quality)
            + weighted(components.fraud, weights.fraud)
            + weighted(components.consistency, weights.consistency);
        let value = round_one_decimal(total / 100.0);

        let contributions = WeightedContributions {
            face: round_one_decimal(weighted(components.face, weights.face) / 100.0),
            document_quality: round_one_decimal(
                weighted(components.document_quality, weights.document_quality) / 100.0,
            ),
            fraud: round_one_decimal(weighted(components.fraud, weights.fraud) / 100.0),
            consistency: round_one_decimal(
                weighted(components.consistency, weights.consistency) / 100.0,
            ),
        };

        let band = TrustBand::for_score(value);
        debug!(
            trust_score = value,
            face = components.face,
            document_quality = components.document_quality,
            fraud = components.fraud,
            consistency = components.consistency,
            "trust score calculated"
        );

        Ok(TrustScore {
            value,
            components,
            weights,
            contributions,
            band,
            recommendation: band.recommendation(),
        })
    }
}

fn ensure_finite(input: &'static str, value: f64) -> Result<(), ScoringError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ScoringError::NonFiniteInput { input })
    }
}

/// Half-way values go to the even neighbour: 41.25 becomes 41.2.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
