//! Provider result module - one provider's attempt at a product

use crate::product::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The outcome of invoking one inference provider for one attempt.
///
/// Produced once per provider per attempt and never mutated after return.
/// Adapter failures are encoded here rather than thrown: a timed-out or
/// unparseable call comes back as `success = false` with `error` populated,
/// so downstream consensus code never special-cases exceptions from the
/// provider boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Identifier of the provider that produced this result
    pub provider_id: String,

    /// Whether the provider produced a usable structured payload
    pub success: bool,

    /// Category the provider determined for the product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub determined_category: Option<String>,

    /// Provider's confidence in its category determination [0.0, 1.0]
    pub category_confidence: f64,

    /// Canonical attribute values keyed by field name
    pub fields: BTreeMap<String, FieldValue>,

    /// Per-field confidence where the provider reported one [0.0, 1.0]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_confidence: BTreeMap<String, f64>,

    /// Schema fields the provider could not populate from the input
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub missing_fields: BTreeSet<String>,

    /// Corrections the provider applied to the raw data
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<Correction>,

    /// Provider's overall confidence in the result [0.0, 1.0]
    pub overall_confidence: f64,

    /// True when the payload was recovered by the last-resort field scrape
    /// rather than a real JSON parse
    #[serde(default)]
    pub degraded: bool,

    /// Failure detail when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderFailure>,
}

impl ProviderResult {
    /// Build an empty failure result for the given provider
    pub fn failure(
        provider_id: impl Into<String>,
        kind: ProviderFailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            success: false,
            determined_category: None,
            category_confidence: 0.0,
            fields: BTreeMap::new(),
            field_confidence: BTreeMap::new(),
            missing_fields: BTreeSet::new(),
            corrections: Vec::new(),
            overall_confidence: 0.0,
            degraded: false,
            error: Some(ProviderFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    /// Confidence the provider holds in a specific field, falling back to
    /// its overall confidence when no per-field figure was reported
    pub fn confidence_for(&self, field: &str) -> f64 {
        self.field_confidence
            .get(field)
            .copied()
            .unwrap_or(self.overall_confidence)
    }
}

/// Why a provider invocation failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Failure classification
    pub kind: ProviderFailureKind,

    /// Human-readable detail
    pub message: String,
}

/// Classification of provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFailureKind {
    /// The call exceeded its deadline
    Timeout,

    /// Network or HTTP-level failure
    Transport,

    /// Authentication or authorization failure
    Auth,

    /// The response text could not be recovered into a structured payload
    Parse,

    /// A payload was recovered but did not expose the required shape
    Rejected,
}

/// A change a provider (or the engine) applied to a raw value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    /// Field the correction applies to
    pub field: String,

    /// Value before the correction
    pub original_value: FieldValue,

    /// Value after the correction
    pub corrected_value: FieldValue,

    /// Why the value was changed
    pub reason: String,

    /// Who made the correction
    pub source: CorrectionSource,
}

/// Origin of a correction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionSource {
    /// A specific provider, by id
    Provider(String),

    /// Both providers independently reported the same correction
    Consensus,

    /// The engine's text cleaning pass
    TextCleaner,
}
