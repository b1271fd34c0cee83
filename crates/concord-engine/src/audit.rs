//! Audit sink backed by structured logging
//!
//! The default sink for deployments without a dedicated tracking service:
//! every attempt, terminal result and issue flag is emitted as a tracing
//! event and otherwise dropped.

use concord_domain::{AuditSink, ConsensusResult, IssueFlag, ProviderResult};
use tracing::{info, warn};

/// Audit sink that emits tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record_attempt(&self, product_id: &str, attempt: u32, results: &[&ProviderResult]) {
        for result in results {
            if result.success {
                info!(
                    product = product_id,
                    attempt,
                    provider = %result.provider_id,
                    category = result.determined_category.as_deref().unwrap_or("-"),
                    confidence = result.overall_confidence,
                    fields = result.fields.len(),
                    "provider attempt"
                );
            } else {
                warn!(
                    product = product_id,
                    attempt,
                    provider = %result.provider_id,
                    error = result.error.as_ref().map(|e| e.message.as_str()).unwrap_or("-"),
                    "provider attempt failed"
                );
            }
        }
    }

    fn record_result(&self, result: &ConsensusResult) {
        info!(
            product = %result.product_id,
            run = %result.run_id,
            agreed = result.agreed,
            agreement_score = result.agreement_score,
            verification_score = result.verification_score,
            retries = result.retry_count,
            outcome = ?result.outcome,
            "run finalized"
        );
    }

    fn record_flags(&self, product_id: &str, flags: &[IssueFlag]) {
        if !flags.is_empty() {
            warn!(product = product_id, ?flags, "issue flags raised");
        }
    }
}
