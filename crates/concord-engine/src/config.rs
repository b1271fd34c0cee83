//! Configuration for the reconciliation engine

use concord_consensus::ConsensusConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the retry/escalation controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum overall agreement score for a run to count as agreed
    pub agreement_threshold: f64,

    /// Field-level consensus thresholds
    #[serde(default)]
    pub consensus: ConsensusConfig,

    /// Maximum field-level retry attempts after the initial pass
    pub max_retries: u32,

    /// Fixed delay between retry attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Per-call deadline for provider invocations (seconds)
    pub provider_timeout_secs: u64,

    /// Delay between products in a batch run (milliseconds)
    pub batch_delay_ms: u64,

    /// Verification score below which an agreed run is still flagged
    /// for attention
    pub low_confidence_floor: f64,
}

impl EngineConfig {
    /// Get the retry delay as a Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Get the provider deadline as a Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Get the inter-product batch delay as a Duration
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.agreement_threshold) || self.agreement_threshold == 0.0 {
            return Err("agreement_threshold must be in (0, 1]".to_string());
        }
        if self.provider_timeout_secs == 0 {
            return Err("provider_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=100.0).contains(&self.low_confidence_floor) {
            return Err("low_confidence_floor must be in [0, 100]".to_string());
        }
        self.consensus.validate()
    }
}

impl Default for EngineConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            agreement_threshold: 0.9,
            consensus: ConsensusConfig::default(),
            max_retries: 3,
            retry_delay_ms: 1000,
            provider_timeout_secs: 30,
            batch_delay_ms: 500,
            low_confidence_floor: 70.0,
        }
    }
}

impl EngineConfig {
    /// Lenient preset: accepts more single-source data, agrees earlier
    pub fn lenient() -> Self {
        Self {
            agreement_threshold: 0.8,
            consensus: ConsensusConfig {
                match_threshold: 0.85,
                accept_threshold: 0.8,
                arbitration_margin: 0.15,
            },
            ..Default::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
