//! Concord Consensus Layer
//!
//! Pure comparison and decision logic for the reconciliation engine:
//!
//! - **Similarity Engine**: type-aware value comparison and aggregate
//!   result-set similarity ([`similarity`])
//! - **Field Consensus Builder**: turns two provider results into per-field
//!   consensus records ([`builder`])
//! - **Verification Score Calculator**: weight-tiered 0-100 confidence
//!   score ([`scoring`])
//!
//! Everything here is synchronous and side-effect free; the retry
//! controller in `concord-engine` drives these functions between provider
//! invocations.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod corrections;
pub mod scoring;
pub mod similarity;

pub use builder::{build_field_consensus, FieldConsensusSet};
pub use config::ConsensusConfig;
pub use corrections::dedupe_corrections;
pub use scoring::verification_score;
pub use similarity::{compare_result_sets, compare_values, ResultSetComparison};
