use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::ExtractedFields;
use super::config::FraudRuleConfig;
use super::dates::{age_on, parse_document_date};
use super::flags::{ConsistencyIssue, FraudFlag};

/// How a pattern entry is compared against the candidate text.
#[derive(Debug, Clone, Copy)]
enum PatternMatch {
    /// Case-insensitive substring.
    Contains(&'static str),
    /// The whole trimmed value, case-insensitive.
    Whole(&'static str),
    /// A single token made only of ASCII uppercase letters.
    UppercaseToken,
    /// Only ASCII digits.
    DigitsOnly,
    /// One or two characters.
    AtMostTwoChars,
}

impl PatternMatch {
    fn matches(self, value: &str) -> bool {
        match self {
            PatternMatch::Contains(needle) => value
                .to_ascii_uppercase()
                .contains(&needle.to_ascii_uppercase()),
            PatternMatch::Whole(expected) => value.eq_ignore_ascii_case(expected),
            PatternMatch::UppercaseToken => value.chars().all(|c| c.is_ascii_uppercase()),
            PatternMatch::DigitsOnly => value.chars().all(|c| c.is_ascii_digit()),
            PatternMatch::AtMostTwoChars => value.chars().count() <= 2,
        }
    }
}

/// Names that look generated, placeholder, or copied from a specimen card.
const SUSPICIOUS_NAME_PATTERNS: [PatternMatch; 6] = [
    PatternMatch::UppercaseToken,
    PatternMatch::DigitsOnly,
    PatternMatch::AtMostTwoChars,
    PatternMatch::Contains("TEST"),
    PatternMatch::Contains("SAMPLE"),
    PatternMatch::Contains("FAKE"),
];

/// Placeholder id numbers; the numeric runs only count when they are the entire id.
const SUSPICIOUS_ID_PATTERNS: [PatternMatch; 7] = [
    PatternMatch::Contains("FAKE"),
    PatternMatch::Contains("TEST"),
    PatternMatch::Contains("SAMPLE"),
    PatternMatch::Contains("SPECIMEN"),
    PatternMatch::Whole("000000"),
    PatternMatch::Whole("123456"),
    PatternMatch::Whole("111111"),
];

const ID_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 5..=20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeCheck {
    pub age: Option<i32>,
    pub underage: bool,
    pub overage: bool,
    pub invalid_dob: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryCheck {
    pub days_until_expiry: Option<i64>,
    pub expired: bool,
    pub expires_soon: bool,
    pub invalid_expiry: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCheck {
    pub empty_name: bool,
    pub suspicious_name: bool,
    pub invalid_characters: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdNumberCheck {
    pub empty_id: bool,
    pub suspicious_id: bool,
    pub invalid_format: bool,
}

pub(crate) fn check_age(dob: &str, today: NaiveDate, config: &FraudRuleConfig) -> AgeCheck {
    let Some(born) = parse_document_date(dob) else {
        return AgeCheck {
            invalid_dob: true,
            ..AgeCheck::default()
        };
    };

    let age = age_on(born, today);
    AgeCheck {
        age: Some(age),
        underage: age < config.minimum_age,
        overage: age > config.maximum_age,
        invalid_dob: false,
    }
}

pub(crate) fn check_expiry(
    expiry_date: &str,
    today: NaiveDate,
    config: &FraudRuleConfig,
) -> ExpiryCheck {
    let Some(expires_on) = parse_document_date(expiry_date) else {
        return ExpiryCheck {
            invalid_expiry: true,
            ..ExpiryCheck::default()
        };
    };

    let days = (expires_on - today).num_days();
    ExpiryCheck {
        days_until_expiry: Some(days),
        expired: expires_on < today,
        expires_soon: (0..=config.expiry_warning_days).contains(&days),
        invalid_expiry: false,
    }
}

pub(crate) fn check_name(name: &str) -> NameCheck {
    let name = name.trim();
    if name.is_empty() {
        return NameCheck {
            empty_name: true,
            ..NameCheck::default()
        };
    }

    NameCheck {
        empty_name: false,
        suspicious_name: SUSPICIOUS_NAME_PATTERNS
            .iter()
            .any(|pattern| pattern.matches(name)),
        invalid_characters: !name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || matches!(c, '-' | '\'' | '.')),
    }
}

pub(crate) fn check_id_number(id_number: &str) -> IdNumberCheck {
    let id_number = id_number.trim();
    if id_number.is_empty() {
        return IdNumberCheck {
            empty_id: true,
            ..IdNumberCheck::default()
        };
    }

    let length_ok = ID_LENGTH_RANGE.contains(&id_number.chars().count());
    let alphanumeric = id_number.chars().all(|c| c.is_ascii_alphanumeric());

    IdNumberCheck {
        empty_id: false,
        suspicious_id: SUSPICIOUS_ID_PATTERNS
            .iter()
            .any(|pattern| pattern.matches(id_number)),
        invalid_format: !length_ok || !alphanumeric,
    }
}

pub(crate) fn check_consistency(
    fields: &ExtractedFields,
    config: &FraudRuleConfig,
) -> Vec<ConsistencyIssue> {
    let mut issues: Vec<ConsistencyIssue> = fields
        .missing_required_fields()
        .into_iter()
        .map(ConsistencyIssue::MissingRequiredField)
        .collect();

    if fields.extraction_confidence < config.minimum_extraction_confidence {
        issues.push(ConsistencyIssue::LowExtractionConfidence);
    }

    if !fields.document_type_resolved() {
        issues.push(ConsistencyIssue::UnresolvedDocumentType);
    }

    issues
}

impl AgeCheck {
    pub(crate) fn flags(&self) -> impl Iterator<Item = FraudFlag> {
        [
            (self.underage, FraudFlag::UnderageUser),
            (self.overage, FraudFlag::UnrealisticAge),
            (self.invalid_dob, FraudFlag::InvalidDateOfBirth),
        ]
        .into_iter()
        .filter_map(|(raised, flag)| raised.then_some(flag))
    }
}

impl ExpiryCheck {
    pub(crate) fn flags(&self) -> impl Iterator<Item = FraudFlag> {
        [
            (self.expired, FraudFlag::ExpiredDocument),
            (self.expires_soon, FraudFlag::DocumentExpiresSoon),
            (self.invalid_expiry, FraudFlag::InvalidExpiryDate),
        ]
        .into_iter()
        .filter_map(|(raised, flag)| raised.then_some(flag))
    }
}

impl NameCheck {
    pub(crate) fn flags(&self) -> impl Iterator<Item = FraudFlag> {
        [
            (self.suspicious_name, FraudFlag::SuspiciousNamePattern),
            (self.empty_name, FraudFlag::MissingName),
            (self.invalid_characters, FraudFlag::InvalidNameCharacters),
        ]
        .into_iter()
        .filter_map(|(raised, flag)| raised.then_some(flag))
    }
}

impl IdNumberCheck {
    pub(crate) fn flags(&self) -> impl Iterator<Item = FraudFlag> {
        [
            (self.suspicious_id, FraudFlag::SuspiciousIdPattern),
            (self.empty_id, FraudFlag::MissingIdNumber),
            (self.invalid_format, FraudFlag::InvalidIdFormat),
        ]
        .into_iter()
        .filter_map(|(raised, flag)| raised.then_some(flag))
    }
}
