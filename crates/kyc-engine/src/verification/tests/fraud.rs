use chrono::Duration;

use super::common::*;
use crate::verification::domain::RequiredField;
use crate::verification::fraud::{
    ConsistencyIssue, FraudFlag, FraudRuleConfig, FraudRuleEngine, RiskLevel,
};

fn engine() -> FraudRuleEngine {
    FraudRuleEngine::new(FraudRuleConfig::default())
}

#[test]
fn clean_passport_raises_no_flags() {
    let assessment = engine().evaluate_on(&clean_fields(), evaluation_date());

    assert!(assessment.flags.is_empty(), "flags: {:?}", assessment.flags);
    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert!(!assessment.has_fraud_indicators());
    assert_eq!(assessment.details.age_validation.age, Some(35));
    assert_eq!(
        assessment.summary(),
        "Risk Level: LOW - No fraud indicators detected"
    );
}

#[test]
fn specimen_card_is_high_risk() {
    let assessment = engine().evaluate_on(&specimen_fields(), evaluation_date());

    assert_eq!(
        assessment.flags,
        vec![
            FraudFlag::InvalidDateOfBirth,
            FraudFlag::SuspiciousNamePattern,
            FraudFlag::SuspiciousIdPattern,
            FraudFlag::ConsistencyIssue(ConsistencyIssue::MissingRequiredField(
                RequiredField::Dob
            )),
            FraudFlag::ConsistencyIssue(ConsistencyIssue::LowExtractionConfidence),
        ]
    );
    assert_eq!(assessment.risk_level, RiskLevel::High);
    assert_eq!(assessment.high_risk_flag_count(), 2);
    assert_eq!(assessment.consistency_issue_count(), 2);
    assert_eq!(assessment.summary(), "Risk Level: HIGH - 5 issues detected");
}

#[test]
fn expiry_window_is_relative_to_evaluation_date() {
    let today = evaluation_date();
    let engine = engine();

    let mut fields = clean_fields();
    fields.expiry_date = (today + Duration::days(10)).format("%Y-%m-%d").to_string();
    let soon = engine.evaluate_on(&fields, today);
    assert_eq!(soon.flags, vec![FraudFlag::DocumentExpiresSoon]);
    assert_eq!(soon.risk_level, RiskLevel::Medium);
    assert_eq!(soon.details.expiry_validation.days_until_expiry, Some(10));

    fields.expiry_date = (today - Duration::days(1)).format("%d/%m/%Y").to_string();
    let expired = engine.evaluate_on(&fields, today);
    assert_eq!(expired.flags, vec![FraudFlag::ExpiredDocument]);
    assert_eq!(expired.risk_level, RiskLevel::High);

    fields.expiry_date = today.format("%Y-%m-%d").to_string();
    let last_day = engine.evaluate_on(&fields, today);
    assert_eq!(last_day.flags, vec![FraudFlag::DocumentExpiresSoon]);
}

#[test]
fn unparseable_dates_become_flags() {
    let mut fields = clean_fields();
    fields.dob = "sometime in the nineties".to_string();
    fields.expiry_date = "2030-13-45".to_string();

    let assessment = engine().evaluate_on(&fields, evaluation_date());

    assert_eq!(
        assessment.flags,
        vec![FraudFlag::InvalidDateOfBirth, FraudFlag::InvalidExpiryDate]
    );
    // Neither flag is in the high or medium tables, but any flag lifts the floor.
    assert_eq!(assessment.risk_level, RiskLevel::Medium);
    assert_eq!(assessment.details.age_validation.age, None);
}

#[test]
fn age_limits_follow_configuration() {
    let mut fields = clean_fields();
    fields.dob = "2010-01-01".to_string();
    let minor = engine().evaluate_on(&fields, evaluation_date());
    assert!(minor.has_flag(FraudFlag::UnderageUser));
    assert_eq!(minor.risk_level, RiskLevel::High);

    let relaxed = FraudRuleEngine::new(FraudRuleConfig {
        minimum_age: 14,
        ..FraudRuleConfig::default()
    });
    assert!(relaxed
        .evaluate_on(&fields, evaluation_date())
        .flags
        .is_empty());

    fields.dob = "1890-01-01".to_string();
    let ancient = engine().evaluate_on(&fields, evaluation_date());
    assert_eq!(ancient.flags, vec![FraudFlag::UnrealisticAge]);
    assert_eq!(ancient.risk_level, RiskLevel::Medium);
}

#[test]
fn blank_fields_count_as_missing() {
    let mut fields = clean_fields();
    fields.name = "   ".to_string();
    fields.id_number = String::new();
    fields.document_type = "Unknown".to_string();

    let assessment = engine().evaluate_on(&fields, evaluation_date());

    assert!(assessment.has_flag(FraudFlag::MissingName));
    assert!(assessment.has_flag(FraudFlag::MissingIdNumber));
    assert_eq!(
        assessment.details.consistency_issues,
        vec![
            ConsistencyIssue::MissingRequiredField(RequiredField::Name),
            ConsistencyIssue::MissingRequiredField(RequiredField::IdNumber),
            ConsistencyIssue::UnresolvedDocumentType,
        ]
    );
    assert_eq!(assessment.risk_level, RiskLevel::High);
}

#[test]
fn risk_level_ignores_flag_order() {
    let flags = vec![
        FraudFlag::InvalidIdFormat,
        FraudFlag::ConsistencyIssue(ConsistencyIssue::LowExtractionConfidence),
        FraudFlag::ExpiredDocument,
    ];
    let mut reversed = flags.clone();
    reversed.reverse();

    assert_eq!(RiskLevel::from_flags(&flags), RiskLevel::High);
    assert_eq!(
        RiskLevel::from_flags(&flags),
        RiskLevel::from_flags(&reversed)
    );
    assert_eq!(RiskLevel::from_flags(&[]), RiskLevel::Low);
}

#[test]
fn evaluation_is_repeatable() {
    let engine = engine();
    let first = engine.evaluate_on(&specimen_fields(), evaluation_date());
    let second = engine.evaluate_on(&specimen_fields(), evaluation_date());
    assert_eq!(first, second);
}

#[test]
fn assessment_serializes_flag_codes() {
    let assessment = engine().evaluate_on(&specimen_fields(), evaluation_date());
    let json = serde_json::to_value(&assessment).expect("serializes");

    assert_eq!(json["risk_level"], "high");
    assert_eq!(json["flags"][0], "invalid_date_of_birth");
    assert_eq!(
        json["flags"][3],
        "consistency_issue: Missing required field: dob"
    );
    assert_eq!(json["details"]["age_validation"]["invalid_dob"], true);
}
