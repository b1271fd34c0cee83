//! Concord CLI - Command-line interface for the reconciliation engine.

use clap::Parser;
use concord_cli::commands;
use concord_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> concord_cli::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Reconcile(args) => {
            commands::execute_reconcile(args, &config, &formatter).await?;
        }
        Command::Batch(args) => {
            commands::execute_batch(args, &config, &formatter).await?;
        }
        Command::Schema(args) => {
            commands::execute_schema(args, &config, &formatter).await?;
        }
    }

    Ok(())
}
