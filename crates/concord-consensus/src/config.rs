//! Consensus thresholds

use serde::{Deserialize, Serialize};

/// Thresholds for the field consensus builder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum similarity for two present values to count as matching
    pub match_threshold: f64,

    /// Minimum provider confidence to accept a single-source value
    pub accept_threshold: f64,

    /// Confidence lead one provider needs over the other to win arbitration
    pub arbitration_margin: f64,
}

impl ConsensusConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.match_threshold) || self.match_threshold == 0.0 {
            return Err("match_threshold must be in (0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err("accept_threshold must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.arbitration_margin) {
            return Err("arbitration_margin must be in [0, 1]".to_string());
        }
        Ok(())
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.9,
            accept_threshold: 0.9,
            arbitration_margin: 0.15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConsensusConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_match_threshold_rejected() {
        let config = ConsensusConfig {
            match_threshold: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_margin_rejected() {
        let config = ConsensusConfig {
            arbitration_margin: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
