use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::super::domain::RequiredField;

/// Discrete indicator raised by a fraud rule.
///
/// Serialized as its stable snake_case code so stored assessments stay readable; consistency
/// issues carry their description after a `consistency_issue: ` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FraudFlag {
    InvalidDateOfBirth,
    UnderageUser,
    UnrealisticAge,
    InvalidExpiryDate,
    ExpiredDocument,
    DocumentExpiresSoon,
    MissingName,
    SuspiciousNamePattern,
    InvalidNameCharacters,
    MissingIdNumber,
    SuspiciousIdPattern,
    InvalidIdFormat,
    ConsistencyIssue(ConsistencyIssue),
}

/// Flags that force a `High` risk level on their own.
pub const HIGH_RISK_FLAGS: [FraudFlag; 6] = [
    FraudFlag::UnderageUser,
    FraudFlag::ExpiredDocument,
    FraudFlag::SuspiciousNamePattern,
    FraudFlag::SuspiciousIdPattern,
    FraudFlag::MissingName,
    FraudFlag::MissingIdNumber,
];

/// Flags that raise the risk level to at least `Medium`.
pub const MEDIUM_RISK_FLAGS: [FraudFlag; 4] = [
    FraudFlag::DocumentExpiresSoon,
    FraudFlag::InvalidNameCharacters,
    FraudFlag::InvalidIdFormat,
    FraudFlag::UnrealisticAge,
];

const CONSISTENCY_PREFIX: &str = "consistency_issue: ";

impl FraudFlag {
    pub fn is_high_risk(&self) -> bool {
        HIGH_RISK_FLAGS.contains(self)
    }

    pub fn is_medium_risk(&self) -> bool {
        MEDIUM_RISK_FLAGS.contains(self)
    }

    fn simple_code(&self) -> Option<&'static str> {
        let code = match self {
            FraudFlag::InvalidDateOfBirth => "invalid_date_of_birth",
            FraudFlag::UnderageUser => "underage_user",
            FraudFlag::UnrealisticAge => "unrealistic_age",
            FraudFlag::InvalidExpiryDate => "invalid_expiry_date",
            FraudFlag::ExpiredDocument => "expired_document",
            FraudFlag::DocumentExpiresSoon => "document_expires_soon",
            FraudFlag::MissingName => "missing_name",
            FraudFlag::SuspiciousNamePattern => "suspicious_name_pattern",
            FraudFlag::InvalidNameCharacters => "invalid_name_characters",
            FraudFlag::MissingIdNumber => "missing_id_number",
            FraudFlag::SuspiciousIdPattern => "suspicious_id_pattern",
            FraudFlag::InvalidIdFormat => "invalid_id_format",
            FraudFlag::ConsistencyIssue(_) => return None,
        };
        Some(code)
    }

    const SIMPLE: [FraudFlag; 12] = [
        FraudFlag::InvalidDateOfBirth,
        FraudFlag::UnderageUser,
        FraudFlag::UnrealisticAge,
        FraudFlag::InvalidExpiryDate,
        FraudFlag::ExpiredDocument,
        FraudFlag::DocumentExpiresSoon,
        FraudFlag::MissingName,
        FraudFlag::SuspiciousNamePattern,
        FraudFlag::InvalidNameCharacters,
        FraudFlag::MissingIdNumber,
        FraudFlag::SuspiciousIdPattern,
        FraudFlag::InvalidIdFormat,
    ];
}

impl fmt::Display for FraudFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FraudFlag::ConsistencyIssue(issue) => write!(f, "{CONSISTENCY_PREFIX}{issue}"),
            other => f.write_str(other.simple_code().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fraud flag '{0}'")]
pub struct UnknownFraudFlag(pub String);

impl FromStr for FraudFlag {
    type Err = UnknownFraudFlag;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(issue) = raw.strip_prefix(CONSISTENCY_PREFIX) {
            return issue.parse().map(FraudFlag::ConsistencyIssue);
        }

        FraudFlag::SIMPLE
            .into_iter()
            .find(|flag| flag.simple_code() == Some(raw))
            .ok_or_else(|| UnknownFraudFlag(raw.to_string()))
    }
}

impl Serialize for FraudFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FraudFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Cross-field problems found while comparing the extracted fields against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConsistencyIssue {
    MissingRequiredField(RequiredField),
    LowExtractionConfidence,
    UnresolvedDocumentType,
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::MissingRequiredField(field) => {
                write!(f, "Missing required field: {field}")
            }
            ConsistencyIssue::LowExtractionConfidence => {
                f.write_str("Low document extraction confidence")
            }
            ConsistencyIssue::UnresolvedDocumentType => {
                f.write_str("Document type could not be determined")
            }
        }
    }
}

impl FromStr for ConsistencyIssue {
    type Err = UnknownFraudFlag;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(field) = raw.strip_prefix("Missing required field: ") {
            return RequiredField::ALL
                .into_iter()
                .find(|candidate| candidate.label() == field)
                .map(ConsistencyIssue::MissingRequiredField)
                .ok_or_else(|| UnknownFraudFlag(raw.to_string()));
        }

        match raw {
            "Low document extraction confidence" => Ok(ConsistencyIssue::LowExtractionConfidence),
            "Document type could not be determined" => Ok(ConsistencyIssue::UnresolvedDocumentType),
            _ => Err(UnknownFraudFlag(raw.to_string())),
        }
    }
}

impl Serialize for ConsistencyIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConsistencyIssue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Coarse classification derived from the flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Fixed precedence: any high-risk flag wins, then any medium-risk flag, then any flag at all.
    pub fn from_flags(flags: &[FraudFlag]) -> Self {
        if flags.iter().any(FraudFlag::is_high_risk) {
            RiskLevel::High
        } else if flags.iter().any(FraudFlag::is_medium_risk) || !flags.is_empty() {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_strings() {
        let flag = FraudFlag::ConsistencyIssue(ConsistencyIssue::MissingRequiredField(
            RequiredField::IdNumber,
        ));
        assert_eq!(
            flag.to_string(),
            "consistency_issue: Missing required field: id_number"
        );
        assert_eq!(flag.to_string().parse::<FraudFlag>(), Ok(flag));
        assert_eq!(
            "suspicious_id_pattern".parse::<FraudFlag>(),
            Ok(FraudFlag::SuspiciousIdPattern)
        );
        assert!("not_a_flag".parse::<FraudFlag>().is_err());
    }

    #[test]
    fn risk_level_ignores_flag_order() {
        let forward = vec![
            FraudFlag::InvalidExpiryDate,
            FraudFlag::UnrealisticAge,
            FraudFlag::MissingName,
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(RiskLevel::from_flags(&forward), RiskLevel::High);
        assert_eq!(
            RiskLevel::from_flags(&forward),
            RiskLevel::from_flags(&reversed)
        );
    }

    #[test]
    fn any_flag_outside_the_named_sets_is_medium() {
        let flags = [FraudFlag::ConsistencyIssue(
            ConsistencyIssue::LowExtractionConfidence,
        )];
        assert_eq!(RiskLevel::from_flags(&flags), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_flags(&[]), RiskLevel::Low);
    }
}
