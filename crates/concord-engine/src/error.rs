//! Error types for the reconciliation engine

use thiserror::Error;

/// Errors that can escape a reconciliation run.
///
/// Provider failures, parse failures, consensus failures and research
/// failures are all handled inside the run and land in fields of the
/// `ConsensusResult`; only genuinely unexpected conditions surface here,
/// and they are fatal to that single run only.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The attribute schema could not be resolved
    #[error("Schema error: {0}")]
    Schema(String),

    /// Engine configuration is not usable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
