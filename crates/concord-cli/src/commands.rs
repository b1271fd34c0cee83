//! Command implementations.

use crate::cli::{BatchArgs, ReconcileArgs, SchemaArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use concord_domain::{RawProduct, SchemaProvider};
use concord_engine::{run_batch, summarize, Reconciler};
use concord_provider::HttpProvider;
use concord_schema::{BrandPicklist, TomlSchemaProvider};
use std::sync::Arc;

/// Build a reconciler from the loaded configuration.
fn build_reconciler(config: &Config) -> Result<Reconciler<TomlSchemaProvider>> {
    let provider_a = HttpProvider::with_timeout(
        &config.providers.a.id,
        &config.providers.a.endpoint,
        &config.providers.a.model,
        config.engine.provider_timeout(),
    )?;
    let provider_b = HttpProvider::with_timeout(
        &config.providers.b.id,
        &config.providers.b.endpoint,
        &config.providers.b.model,
        config.engine.provider_timeout(),
    )?;
    let schema_provider = TomlSchemaProvider::from_file(&config.schema_path)?;

    let mut reconciler = Reconciler::new(
        Arc::new(provider_a),
        Arc::new(provider_b),
        schema_provider,
        config.engine.clone(),
    )?;

    if let Some(path) = &config.brands_path {
        let picklist = BrandPicklist::from_json_file(path).map_err(CliError::Config)?;
        reconciler = reconciler.with_brand_picklist(picklist);
    }

    Ok(reconciler)
}

fn load_product(path: &str) -> Result<RawProduct> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("{}: {}", path, e)))
}

fn load_products(path: &str) -> Result<Vec<RawProduct>> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("{}: {}", path, e)))
}

/// Execute the reconcile command.
pub async fn execute_reconcile(
    args: ReconcileArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let mut product = load_product(&args.input)?;
    if let Some(hint) = args.category_hint {
        product.category_hint = Some(hint);
    }

    let reconciler = build_reconciler(config)?;
    let result = reconciler.reconcile(&product).await?;

    println!("{}", formatter.format_result(&result)?);
    Ok(())
}

/// Execute the batch command.
pub async fn execute_batch(args: BatchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let products = load_products(&args.input)?;
    if products.is_empty() {
        return Err(CliError::Input("batch input is empty".to_string()));
    }

    let reconciler = build_reconciler(config)?;
    let results = run_batch(&reconciler, &products).await;

    for result in &results {
        match result {
            Ok(result) => println!("{}", formatter.format_result(result)?),
            Err(e) => eprintln!("{}", formatter.error(&e.to_string())),
        }
    }
    println!("{}", formatter.format_summary(&summarize(&results))?);
    Ok(())
}

/// Execute the schema command.
pub async fn execute_schema(
    args: SchemaArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let provider = TomlSchemaProvider::from_file(&config.schema_path)?;
    let schema = provider.schema_for(&args.category)?;

    for field in &schema.fields {
        println!("{:<28} {:?} ({:?})", field.name, field.field_type, field.tier);
    }
    println!(
        "{}",
        formatter.success(&format!(
            "{} fields for category '{}'",
            schema.fields.len(),
            schema.category
        ))
    );
    Ok(())
}
