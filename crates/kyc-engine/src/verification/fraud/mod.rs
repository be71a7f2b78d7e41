mod config;
mod dates;
mod flags;
mod rules;

pub use config::FraudRuleConfig;
pub use flags::{
    ConsistencyIssue, FraudFlag, RiskLevel, UnknownFraudFlag, HIGH_RISK_FLAGS, MEDIUM_RISK_FLAGS,
};
pub use rules::{AgeCheck, ExpiryCheck, IdNumberCheck, NameCheck};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::ExtractedFields;

/// Stateless evaluator applying the document rules to extracted fields.
///
/// Unparseable or missing inputs become flags; evaluation itself never fails.
#[derive(Debug, Clone, Default)]
pub struct FraudRuleEngine {
    config: FraudRuleConfig,
}

impl FraudRuleEngine {
    pub fn new(config: FraudRuleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FraudRuleConfig {
        &self.config
    }

    pub fn evaluate(&self, fields: &ExtractedFields) -> FraudAssessment {
        self.evaluate_on(fields, Local::now().date_naive())
    }

    /// Evaluate as of `today`, which anchors the age and expiry checks.
    pub fn evaluate_on(&self, fields: &ExtractedFields, today: NaiveDate) -> FraudAssessment {
        let details = FraudCheckDetails {
            age_validation: rules::check_age(&fields.dob, today, &self.config),
            expiry_validation: rules::check_expiry(&fields.expiry_date, today, &self.config),
            name_validation: rules::check_name(&fields.name),
            id_validation: rules::check_id_number(&fields.id_number),
            consistency_issues: rules::check_consistency(fields, &self.config),
        };

        let flags: Vec<FraudFlag> = details
            .age_validation
            .flags()
            .chain(details.expiry_validation.flags())
            .chain(details.name_validation.flags())
            .chain(details.id_validation.flags())
            .chain(
                details
                    .consistency_issues
                    .iter()
                    .copied()
                    .map(FraudFlag::ConsistencyIssue),
            )
            .collect();

        let risk_level = RiskLevel::from_flags(&flags);
        debug!(
            risk_level = risk_level.label(),
            flag_count = flags.len(),
            "fraud rules evaluated"
        );

        FraudAssessment {
            flags,
            risk_level,
            details,
        }
    }
}

/// Per-check detail records kept for audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FraudCheckDetails {
    pub age_validation: AgeCheck,
    pub expiry_validation: ExpiryCheck,
    pub name_validation: NameCheck,
    pub id_validation: IdNumberCheck,
    pub consistency_issues: Vec<ConsistencyIssue>,
}

/// Flags in discovery order plus the risk level derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub flags: Vec<FraudFlag>,
    pub risk_level: RiskLevel,
    pub details: FraudCheckDetails,
}

impl FraudAssessment {
    pub fn has_fraud_indicators(&self) -> bool {
        !self.flags.is_empty()
    }

    pub fn has_flag(&self, flag: FraudFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn high_risk_flag_count(&self) -> usize {
        self.flags.iter().filter(|flag| flag.is_high_risk()).count()
    }

    pub fn consistency_issue_count(&self) -> usize {
        self.details.consistency_issues.len()
    }

    pub fn summary(&self) -> String {
        let level = self.risk_level.label().to_ascii_uppercase();
        if self.flags.is_empty() {
            format!("Risk Level: {level} - No fraud indicators detected")
        } else {
            format!(
                "Risk Level: {level} - {} issues detected",
                self.flags.len()
            )
        }
    }
}
