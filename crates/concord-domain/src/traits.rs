//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the reconciliation engine and
//! its collaborators. Infrastructure implementations live in other crates.

use crate::provider_result::ProviderResult;
use crate::result::ConsensusResult;
use crate::schema::AttributeSchema;
use serde::{Deserialize, Serialize};

/// Trait for resolving a category to its attribute schema
///
/// Implemented by the infrastructure layer (concord-schema). Read-only and
/// cached per category; a run never mutates schema state.
pub trait SchemaProvider {
    /// Error type for schema operations
    type Error;

    /// Resolve the attribute schema for a category
    fn schema_for(&self, category: &str) -> Result<AttributeSchema, Self::Error>;

    /// The global primary fields applied to every category
    fn primary_fields(&self) -> Result<AttributeSchema, Self::Error>;
}

/// Issue flags derived from a run for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueFlag {
    /// A provider invocation failed outright
    AiError,

    /// The run terminated without agreement
    ConsensusFailure,

    /// The providers disagreed on the category
    CategoryMismatch,

    /// The run agreed but with a low verification score
    LowConfidence,

    /// A research pass could not fill a missing field
    ResearchFailed,
}

/// Trait for the audit/tracking sink
///
/// Receives per-attempt provider results, the final consensus result, and
/// derived issue flags, for observability only. Implementations must absorb
/// their own failures; the engine's correctness never depends on this sink
/// succeeding, so the methods do not return errors.
pub trait AuditSink: Send + Sync {
    /// Record one attempt's pair of provider results
    fn record_attempt(&self, product_id: &str, attempt: u32, results: &[&ProviderResult]);

    /// Record the terminal result of a run
    fn record_result(&self, result: &ConsensusResult);

    /// Record issue flags derived from a run
    fn record_flags(&self, product_id: &str, flags: &[IssueFlag]);
}

/// An audit sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record_attempt(&self, _product_id: &str, _attempt: u32, _results: &[&ProviderResult]) {}

    fn record_result(&self, _result: &ConsensusResult) {}

    fn record_flags(&self, _product_id: &str, _flags: &[IssueFlag]) {}
}
