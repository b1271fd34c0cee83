//! Concord Domain Layer
//!
//! This crate contains the core data model for Concord, the dual-provider
//! product-attribute reconciliation engine. It defines the records exchanged
//! between the provider adapters, the consensus builder and the retry
//! controller, plus the trait interfaces the engine consumes.
//!
//! ## Key Concepts
//!
//! - **ProviderResult**: one provider's attempt at categorizing a product and
//!   mapping its raw fields into the canonical attribute schema
//! - **FieldConsensus**: the per-field record of both providers' values and
//!   the resolved outcome
//! - **ConsensusResult**: the terminal, immutable output of one
//!   reconciliation run
//! - **RetryContext**: disagreement state carried into a re-invocation
//!
//! ## Architecture
//!
//! This crate holds value objects and trait seams only. Infrastructure
//! implementations (HTTP providers, TOML schema loading, the controller)
//! live in other crates. Every record here is produced fresh and treated as
//! immutable once returned; field-name maps use ordered collections so a run
//! over identical inputs yields bit-identical output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod consensus;
pub mod product;
pub mod provider_result;
pub mod result;
pub mod retry;
pub mod schema;
pub mod traits;

// Re-exports for convenience
pub use consensus::{ConsensusSource, Discrepancy, FieldConsensus};
pub use product::{FieldValue, RawProduct};
pub use provider_result::{
    Correction, CorrectionSource, ProviderFailure, ProviderFailureKind, ProviderResult,
};
pub use result::{ConsensusResult, RunId, RunOutcome};
pub use retry::RetryContext;
pub use schema::{AttributeSchema, FieldSpec, FieldType, WeightTier};
pub use traits::{AuditSink, IssueFlag, NullAuditSink, SchemaProvider};
