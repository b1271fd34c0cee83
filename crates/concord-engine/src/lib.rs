//! Concord Engine
//!
//! The retry/escalation controller: drives a reconciliation run through
//! its passes (initial fan-out, cross-validation, bounded retries,
//! research), delegating comparison to `concord-consensus` and provider
//! I/O to `concord-provider`, and finalizing one immutable
//! `ConsensusResult` per product.
//!
//! # Concurrency model
//!
//! The two provider calls of an attempt run concurrently under a shared
//! deadline; everything else is strictly sequential. Runs over a batch of
//! products are also sequential, separated by a configured delay. No state
//! is shared across concurrent verifications; each run owns its state from
//! start to finish.

#![warn(missing_docs)]

pub mod audit;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;


pub use audit::TracingAuditSink;
pub use batch::{run_batch, summarize, BatchItem, BatchSummary};
pub use config::EngineConfig;
pub use engine::Reconciler;
pub use error::EngineError;
