//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Concord CLI - Reconcile product attributes from two inference providers.
#[derive(Debug, Parser)]
#[command(name = "concord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "concord.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (outcome only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile a single product
    Reconcile(ReconcileArgs),

    /// Reconcile a batch of products sequentially
    Batch(BatchArgs),

    /// Inspect the attribute schema for a category
    Schema(SchemaArgs),
}

/// Arguments for the reconcile command.
#[derive(Debug, Parser)]
pub struct ReconcileArgs {
    /// Path to a JSON product record ({"id", "data", "category_hint"?})
    pub input: String,

    /// Override the category hint from the input file
    #[arg(long)]
    pub category_hint: Option<String>,
}

/// Arguments for the batch command.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Path to a JSON array of product records
    pub input: String,
}

/// Arguments for the schema command.
#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Category to resolve
    pub category: String,
}
