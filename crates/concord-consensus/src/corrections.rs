//! Correction merging
//!
//! Both providers may report corrections they applied to the raw data.
//! When both independently report the same `(field, corrected_value)`
//! pair, the duplicate collapses into a single correction attributed to
//! consensus.

use concord_domain::{Correction, CorrectionSource};
use std::collections::BTreeMap;

/// Merge and deduplicate corrections from both providers.
///
/// Identical `(field, corrected_value)` pairs reported by both sides are
/// collapsed into one correction with `source = Consensus`; everything
/// else passes through in input order (provider A's first).
pub fn dedupe_corrections(from_a: &[Correction], from_b: &[Correction]) -> Vec<Correction> {
    let mut seen: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut merged: Vec<Correction> = Vec::new();

    for correction in from_a.iter().chain(from_b.iter()) {
        let key = (
            correction.field.clone(),
            correction.corrected_value.to_string(),
        );
        match seen.get(&key) {
            Some(&index) => {
                // Same fix from both sides: promote to consensus
                merged[index].source = CorrectionSource::Consensus;
            }
            None => {
                seen.insert(key, merged.len());
                merged.push(correction.clone());
            }
        }
    }

    merged
}
