//! Terminal output of a reconciliation run

use crate::consensus::Discrepancy;
use crate::product::FieldValue;
use crate::provider_result::Correction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier for a reconciliation run based on UUIDv7
///
/// UUIDv7 provides:
/// - Chronological sortability for audit queries
/// - 128-bit uniqueness
/// - No coordination required for distributed generation
///
/// Serializes as the canonical hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u128);

impl Serialize for RunId {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        RunId::from_string(&text).map_err(serde::de::Error::custom)
    }
}

impl RunId {
    /// Generate a new UUIDv7-based RunId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RunId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RunId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUID string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Get the timestamp component of the UUIDv7 (milliseconds since Unix epoch)
    pub fn timestamp(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// How a run terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Providers reached agreement within budget
    Agreed,

    /// Retry budget exhausted without agreement; needs manual review
    Escalated,

    /// Both providers failed outright; nothing to merge
    Failed,
}

/// Terminal output of one reconciliation run.
///
/// Immutable once returned. `agreed = true` requires both that the
/// agreement score cleared the configured threshold and that no unresolved
/// discrepancy remains (the strict consensus policy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Unique run identifier
    pub run_id: RunId,

    /// Product the run reconciled
    pub product_id: String,

    /// Category both providers settled on, when one was agreed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Whether the strict consensus policy was satisfied
    pub agreed: bool,

    /// Aggregate agreement score [0.0, 1.0]
    pub agreement_score: f64,

    /// Weight-tiered verification score [0.0, 100.0]
    pub verification_score: f64,

    /// Accepted field values
    pub merged_fields: BTreeMap<String, FieldValue>,

    /// Deduplicated corrections from both providers and the text cleaner
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<Correction>,

    /// Fields where the providers disagreed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discrepancies: Vec<Discrepancy>,

    /// Fields neither provider could populate
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub needs_research: BTreeSet<String>,

    /// Number of field-level retry attempts consumed
    pub retry_count: u32,

    /// Terminal state of the run
    pub outcome: RunOutcome,

    /// Unix timestamp (seconds) when the run finalized
    pub finalized_at: u64,
}

impl ConsensusResult {
    /// Count of discrepancies that never resolved
    pub fn unresolved_count(&self) -> usize {
        self.discrepancies.iter().filter(|d| !d.resolved).count()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: RunId ordering matches u128 ordering
        #[test]
        fn test_run_id_ordering_property(a: u128, b: u128) {
            let id_a = RunId::from_value(a);
            let id_b = RunId::from_value(b);

            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        /// Property: round-trip through string representation preserves ID
        #[test]
        fn test_run_id_string_roundtrip(value: u128) {
            let id = RunId::from_value(value);
            let id_str = id.to_string();

            match RunId::from_string(&id_str) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
