//! Error types for schema loading

use thiserror::Error;

/// Errors that can occur loading or resolving schemas
#[derive(Error, Debug)]
pub enum SchemaError {
    /// File could not be read
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML document could not be parsed
    #[error("Failed to parse schema document: {0}")]
    Parse(String),

    /// Document parsed but is not usable
    #[error("Invalid schema document: {0}")]
    Invalid(String),
}
