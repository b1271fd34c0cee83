//! Verification score calculator
//!
//! Converts consensus state into a single 0-100 confidence score using
//! tier weights from the attribute schema: primary fields weigh 3, filter
//! fields 2, everything else 1. A field earns full credit when both
//! providers agreed, partial credit (0.7) when a single provider's value
//! was accepted, and nothing when it stayed unresolved or missing.

use crate::builder::FieldConsensusSet;
use concord_domain::{AttributeSchema, ConsensusSource};
use std::collections::BTreeSet;

/// Credit for a field accepted from a single provider
const SINGLE_SOURCE_CREDIT: f64 = 0.7;

/// Compute the weight-tiered verification score in [0.0, 100.0].
///
/// The scored universe is the union of the schema's fields and every field
/// the consensus pass saw (including fields queued for research). Schema
/// fields nobody populated count against the score with zero credit; extra
/// fields outside the schema score at Additional weight. An empty universe
/// scores 0.
pub fn verification_score(consensus: &FieldConsensusSet, schema: &AttributeSchema) -> f64 {
    let universe: BTreeSet<&str> = schema
        .field_names()
        .chain(consensus.fields.keys().map(|k| k.as_str()))
        .chain(consensus.needs_research.iter().map(|k| k.as_str()))
        .collect();

    if universe.is_empty() {
        return 0.0;
    }

    let mut weighted_credit = 0.0;
    let mut total_weight = 0.0;

    for name in universe {
        let weight = schema.tier_for(name).weight() as f64;
        total_weight += weight;

        let credit = match consensus.fields.get(name).map(|c| c.source) {
            Some(ConsensusSource::Consensus) => 1.0,
            Some(ConsensusSource::ProviderAOnly) | Some(ConsensusSource::ProviderBOnly) => {
                SINGLE_SOURCE_CREDIT
            }
            Some(ConsensusSource::Unresolved) | None => 0.0,
        };
        weighted_credit += weight * credit;
    }

    100.0 * weighted_credit / total_weight
}
