//! Error types for the CLI.

use thiserror::Error;

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Error, Debug)]
pub enum CliError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input file could not be parsed
    #[error("Invalid input: {0}")]
    Input(String),

    /// Engine error
    #[error("Engine error: {0}")]
    Engine(#[from] concord_engine::EngineError),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] concord_schema::SchemaError),

    /// Provider construction error
    #[error("Provider error: {0}")]
    Provider(#[from] concord_provider::ProviderError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
