//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use concord_domain::{ConsensusResult, RunOutcome};
use concord_engine::BatchSummary;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one reconciliation result.
    pub fn format_result(&self, result: &ConsensusResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Table => Ok(self.format_result_table(result)),
            OutputFormat::Quiet => Ok(format!(
                "{} {}",
                result.product_id,
                outcome_label(result.outcome)
            )),
        }
    }

    fn format_result_table(&self, result: &ConsensusResult) -> String {
        let mut sections = Vec::new();

        let mut builder = Builder::default();
        builder.push_record(["Product", "Outcome", "Agreement", "Score", "Retries"]);
        builder.push_record([
            &result.product_id,
            outcome_label(result.outcome),
            &format!("{:.2}", result.agreement_score),
            &format!("{:.0}", result.verification_score),
            &result.retry_count.to_string(),
        ]);
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        sections.push(table.to_string());

        if !result.merged_fields.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (name, value) in &result.merged_fields {
                builder.push_record([name.as_str(), &render_value(value)]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            sections.push(table.to_string());
        }

        let open: Vec<_> = result.discrepancies.iter().filter(|d| !d.resolved).collect();
        if !open.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Unresolved Field", "Provider A", "Provider B"]);
            for discrepancy in open {
                builder.push_record([
                    discrepancy.field.as_str(),
                    &discrepancy
                        .provider_a_value
                        .as_ref()
                        .map(render_value)
                        .unwrap_or_else(|| "-".to_string()),
                    &discrepancy
                        .provider_b_value
                        .as_ref()
                        .map(render_value)
                        .unwrap_or_else(|| "-".to_string()),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            sections.push(self.colorize("Needs manual review:", "yellow"));
            sections.push(table.to_string());
        }

        if !result.needs_research.is_empty() {
            let fields: Vec<&str> = result.needs_research.iter().map(|f| f.as_str()).collect();
            sections.push(self.colorize(
                &format!("Unfilled after research: {}", fields.join(", ")),
                "yellow",
            ));
        }

        sections.join("\n")
    }

    /// Format a batch summary line.
    pub fn format_summary(&self, summary: &BatchSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            _ => Ok(format!(
                "{} products: {} agreed, {} escalated, {} failed, {} errored",
                summary.total, summary.agreed, summary.escalated, summary.failed, summary.errored
            )),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }
        match color {
            "green" => text.green().to_string(),
            "red" => text.red().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Agreed => "agreed",
        RunOutcome::Escalated => "escalated",
        RunOutcome::Failed => "failed",
    }
}

/// Render a JSON value for table cells (strings bare, rest compact)
fn render_value(value: &concord_domain::FieldValue) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
