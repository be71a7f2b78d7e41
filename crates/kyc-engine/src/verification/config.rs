use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::fraud::FraudRuleConfig;
use super::policy::PolicyConfig;

const DEFAULT_NARRATIVE_TIMEOUT_SECS: u64 = 30;

/// Rule thresholds, decision cut-offs and collaborator budgets for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub fraud: FraudRuleConfig,
    pub policy: PolicyConfig,
    pub narrative_timeout_ms: u64,
}

impl VerificationConfig {
    pub fn narrative_timeout(&self) -> Duration {
        Duration::from_millis(self.narrative_timeout_ms)
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            fraud: FraudRuleConfig::default(),
            policy: PolicyConfig::default(),
            narrative_timeout_ms: DEFAULT_NARRATIVE_TIMEOUT_SECS * 1_000,
        }
    }
}
