//! Sequential batch runner
//!
//! Products are reconciled strictly one after another, never concurrently,
//! with a fixed delay between them to bound the aggregate request rate
//! against the two providers.

use crate::engine::Reconciler;
use crate::error::EngineError;
use concord_domain::{ConsensusResult, RawProduct, RunOutcome, SchemaProvider};
use serde::Serialize;
use std::fmt::Display;
use tokio::time::sleep;
use tracing::info;

/// Per-product outcome of a batch run
pub type BatchItem = Result<ConsensusResult, EngineError>;

/// Aggregate counts over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Products processed
    pub total: usize,

    /// Runs that reached agreement
    pub agreed: usize,

    /// Runs escalated for manual review
    pub escalated: usize,

    /// Runs where both providers failed
    pub failed: usize,

    /// Runs aborted by an engine error
    pub errored: usize,
}

/// Reconcile a batch of products sequentially.
///
/// A failed run does not stop the batch; every product gets its own entry
/// in the returned list, in input order.
pub async fn run_batch<S>(
    reconciler: &Reconciler<S>,
    products: &[RawProduct],
) -> Vec<BatchItem>
where
    S: SchemaProvider,
    S::Error: Display,
{
    let mut results = Vec::with_capacity(products.len());

    for (index, product) in products.iter().enumerate() {
        if index > 0 {
            sleep(reconciler.config().batch_delay()).await;
        }
        info!(
            product = %product.id,
            position = index + 1,
            total = products.len(),
            "batch item"
        );
        results.push(reconciler.reconcile(product).await);
    }

    results
}

/// Summarize a batch's outcomes
pub fn summarize(results: &[BatchItem]) -> BatchSummary {
    let mut summary = BatchSummary {
        total: results.len(),
        ..Default::default()
    };
    for result in results {
        match result {
            Ok(r) => match r.outcome {
                RunOutcome::Agreed => summary.agreed += 1,
                RunOutcome::Escalated => summary.escalated += 1,
                RunOutcome::Failed => summary.failed += 1,
            },
            Err(_) => summary.errored += 1,
        }
    }
    summary
}
