//! Per-field consensus records and discrepancies

use crate::product::FieldValue;
use serde::{Deserialize, Serialize};

/// How a field's final value was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusSource {
    /// Both providers supplied values that satisfy the match predicate
    Consensus,

    /// Only provider A's value was accepted
    ProviderAOnly,

    /// Only provider B's value was accepted
    ProviderBOnly,

    /// No value could be accepted
    Unresolved,
}

/// The per-field outcome of comparing two provider results.
///
/// One record exists for every distinct field name either provider emitted.
/// Records are rebuilt fresh on every attempt; a later attempt supersedes
/// the whole map rather than mutating entries in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConsensus {
    /// Field name
    pub field: String,

    /// Provider A's value, if it supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_a_value: Option<FieldValue>,

    /// Provider B's value, if it supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_b_value: Option<FieldValue>,

    /// Whether the two values satisfied the match predicate
    pub agreed: bool,

    /// The accepted value, when one was accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_value: Option<FieldValue>,

    /// How the final value was decided
    pub source: ConsensusSource,
}

impl FieldConsensus {
    /// Whether this field ended without an accepted value
    pub fn is_unresolved(&self) -> bool {
        self.source == ConsensusSource::Unresolved
    }
}

/// A field where the providers disagreed.
///
/// Derived view over [`FieldConsensus`] entries with `agreed = false`;
/// `resolved` records whether arbitration or research later accepted a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Field name
    pub field: String,

    /// Provider A's value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_a_value: Option<FieldValue>,

    /// Provider B's value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_b_value: Option<FieldValue>,

    /// Whether a resolution was accepted
    pub resolved: bool,

    /// The accepted resolution value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<FieldValue>,

    /// Who supplied the resolution (a provider id, or "manual")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_source: Option<String>,
}

impl Discrepancy {
    /// Derive a discrepancy from a non-agreeing field consensus
    pub fn from_consensus(consensus: &FieldConsensus, resolution_source: Option<String>) -> Self {
        Self {
            field: consensus.field.clone(),
            provider_a_value: consensus.provider_a_value.clone(),
            provider_b_value: consensus.provider_b_value.clone(),
            resolved: consensus.final_value.is_some(),
            resolution: consensus.final_value.clone(),
            resolution_source,
        }
    }
}
