use serde::{Deserialize, Serialize};

/// Thresholds used by the fraud rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudRuleConfig {
    pub minimum_age: i32,
    pub maximum_age: i32,
    pub expiry_warning_days: i64,
    pub minimum_extraction_confidence: f64,
}

impl Default for FraudRuleConfig {
    fn default() -> Self {
        Self {
            minimum_age: 18,
            maximum_age: 120,
            expiry_warning_days: 30,
            minimum_extraction_confidence: 80.0,
        }
    }
}
