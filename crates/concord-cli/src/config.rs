//! CLI configuration loading.

use crate::error::{CliError, Result};
use concord_engine::EngineConfig;
use serde::Deserialize;
use std::path::Path;

/// Output format preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// JSON
    Json,
    /// Outcome only
    Quiet,
}

impl From<crate::cli::CliFormat> for OutputFormat {
    fn from(format: crate::cli::CliFormat) -> Self {
        match format {
            crate::cli::CliFormat::Table => OutputFormat::Table,
            crate::cli::CliFormat::Json => OutputFormat::Json,
            crate::cli::CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

/// One provider's connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Stable provider identifier
    pub id: String,

    /// Service base URL
    pub endpoint: String,

    /// Model name to request
    pub model: String,
}

/// Provider pair.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// First provider
    pub a: ProviderConfig,

    /// Second provider
    pub b: ProviderConfig,
}

/// Output settings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OutputSettings {
    /// Preferred output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Whether to colorize output
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_color() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            color: default_color(),
        }
    }
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the attribute schema TOML document
    pub schema_path: String,

    /// Optional path to a JSON brand picklist
    #[serde(default)]
    pub brands_path: Option<String>,

    /// Engine settings; defaults apply when the section is absent
    #[serde(default)]
    pub engine: EngineConfig,

    /// The two inference providers
    pub providers: ProvidersConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config =
            toml::from_str(&text).map_err(|e| CliError::Config(e.to_string()))?;
        config
            .engine
            .validate()
            .map_err(CliError::Config)?;
        Ok(config)
    }
}
