//! Field consensus builder
//!
//! Turns two provider results into per-field consensus records. The
//! builder is pure: it is re-run from scratch on every attempt and its
//! output supersedes, never amends, the previous attempt's map.

use crate::config::ConsensusConfig;
use crate::similarity::compare_values;
use concord_domain::{
    ConsensusSource, Discrepancy, FieldConsensus, FieldValue, ProviderResult,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Output of one consensus-building pass
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConsensusSet {
    /// Per-field consensus, keyed by field name
    pub fields: BTreeMap<String, FieldConsensus>,

    /// Fields neither provider could populate. Disjoint from the
    /// disagreement set: these were absent on both sides, not disputed.
    pub needs_research: BTreeSet<String>,
}

impl FieldConsensusSet {
    /// Derive the discrepancy list: one entry per non-agreeing field
    pub fn discrepancies(&self) -> Vec<Discrepancy> {
        self.fields
            .values()
            .filter(|c| !c.agreed)
            .map(|c| {
                let source = match c.source {
                    ConsensusSource::ProviderAOnly => Some("provider_a".to_string()),
                    ConsensusSource::ProviderBOnly => Some("provider_b".to_string()),
                    _ => None,
                };
                Discrepancy::from_consensus(c, source)
            })
            .collect()
    }

    /// Whether any field ended without an accepted value
    pub fn has_unresolved(&self) -> bool {
        self.fields.values().any(|c| c.is_unresolved())
    }

    /// Accepted values, keyed by field name
    pub fn merged_fields(&self) -> BTreeMap<String, FieldValue> {
        self.fields
            .iter()
            .filter_map(|(name, c)| c.final_value.clone().map(|v| (name.clone(), v)))
            .collect()
    }
}

/// Build per-field consensus over the union of both results' field names.
///
/// Decision per field:
/// - both present and similarity >= `match_threshold` → consensus, with
///   provider A's rendering as the final value
/// - exactly one present → accepted iff that provider's confidence clears
///   `accept_threshold`, else unresolved
/// - both present but dissimilar → arbitration: the higher-confidence
///   provider wins only with a lead greater than `arbitration_margin` and
///   a confidence above `accept_threshold`
///
/// Values equal to the literal string "unknown" are treated as absent.
/// Fields absent from both sides (including fields both providers listed
/// as missing) land in `needs_research`, not in the consensus map.
pub fn build_field_consensus(
    result_a: &ProviderResult,
    result_b: &ProviderResult,
    config: &ConsensusConfig,
) -> FieldConsensusSet {
    let mut fields = BTreeMap::new();
    let mut needs_research: BTreeSet<String> = result_a
        .missing_fields
        .intersection(&result_b.missing_fields)
        .cloned()
        .collect();

    let names: BTreeSet<&str> = result_a
        .fields
        .keys()
        .chain(result_b.fields.keys())
        .map(|k| k.as_str())
        .collect();

    for name in names {
        let value_a = effective_value(result_a.fields.get(name));
        let value_b = effective_value(result_b.fields.get(name));

        let consensus = match (value_a, value_b) {
            (Some(a), Some(b)) => both_present(name, a, b, result_a, result_b, config),
            (Some(a), None) => one_present(
                name,
                a,
                result_a.confidence_for(name),
                ConsensusSource::ProviderAOnly,
                config,
            ),
            (None, Some(b)) => one_present(
                name,
                b,
                result_b.confidence_for(name),
                ConsensusSource::ProviderBOnly,
                config,
            ),
            (None, None) => {
                // Both sides reported the field but carried no usable value
                needs_research.insert(name.to_string());
                continue;
            }
        };

        fields.insert(name.to_string(), consensus);
    }

    debug!(
        field_count = fields.len(),
        needs_research = needs_research.len(),
        "built field consensus"
    );

    FieldConsensusSet {
        fields,
        needs_research,
    }
}

/// Treat null and the literal "unknown" as absent
fn effective_value(value: Option<&FieldValue>) -> Option<&FieldValue> {
    match value {
        None | Some(FieldValue::Null) => None,
        Some(v) if is_unknown(v) => None,
        Some(v) => Some(v),
    }
}

fn is_unknown(value: &FieldValue) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("unknown"))
}

fn both_present(
    name: &str,
    a: &FieldValue,
    b: &FieldValue,
    result_a: &ProviderResult,
    result_b: &ProviderResult,
    config: &ConsensusConfig,
) -> FieldConsensus {
    let similarity = compare_values(a, b);
    if similarity >= config.match_threshold {
        return FieldConsensus {
            field: name.to_string(),
            provider_a_value: Some(a.clone()),
            provider_b_value: Some(b.clone()),
            agreed: true,
            final_value: Some(a.clone()),
            source: ConsensusSource::Consensus,
        };
    }

    // Arbitration: a clear confidence lead that also clears the accept bar
    let conf_a = result_a.confidence_for(name);
    let conf_b = result_b.confidence_for(name);
    let (final_value, source) =
        if conf_a - conf_b > config.arbitration_margin && conf_a >= config.accept_threshold {
            (Some(a.clone()), ConsensusSource::ProviderAOnly)
        } else if conf_b - conf_a > config.arbitration_margin && conf_b >= config.accept_threshold {
            (Some(b.clone()), ConsensusSource::ProviderBOnly)
        } else {
            (None, ConsensusSource::Unresolved)
        };

    debug!(
        field = name,
        similarity,
        conf_a,
        conf_b,
        resolved = final_value.is_some(),
        "field below match threshold"
    );

    FieldConsensus {
        field: name.to_string(),
        provider_a_value: Some(a.clone()),
        provider_b_value: Some(b.clone()),
        agreed: false,
        final_value,
        source,
    }
}

fn one_present(
    name: &str,
    value: &FieldValue,
    confidence: f64,
    source: ConsensusSource,
    config: &ConsensusConfig,
) -> FieldConsensus {
    let accepted = confidence >= config.accept_threshold;
    let (provider_a_value, provider_b_value) = match source {
        ConsensusSource::ProviderAOnly => (Some(value.clone()), None),
        _ => (None, Some(value.clone())),
    };

    FieldConsensus {
        field: name.to_string(),
        provider_a_value,
        provider_b_value,
        agreed: false,
        final_value: accepted.then(|| value.clone()),
        source: if accepted {
            source
        } else {
            ConsensusSource::Unresolved
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_result(
        id: &str,
        fields: &[(&str, FieldValue)],
        overall_confidence: f64,
    ) -> ProviderResult {
        ProviderResult {
            provider_id: id.to_string(),
            success: true,
            determined_category: Some("Bathtubs".to_string()),
            category_confidence: 0.9,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            field_confidence: BTreeMap::new(),
            missing_fields: BTreeSet::new(),
            corrections: Vec::new(),
            overall_confidence,
            degraded: false,
            error: None,
        }
    }

    fn config() -> ConsensusConfig {
        ConsensusConfig::default()
    }

    #[test]
    fn test_identical_fields_all_consensus() {
        let fields = [("brand", json!("Kohler")), ("width", json!(30))];
        let a = provider_result("a", &fields, 0.9);
        let b = provider_result("b", &fields, 0.9);

        let set = build_field_consensus(&a, &b, &config());
        assert_eq!(set.fields.len(), 2);
        assert!(set
            .fields
            .values()
            .all(|c| c.source == ConsensusSource::Consensus && c.agreed));
        assert!(set.discrepancies().is_empty());
    }

    #[test]
    fn test_case_and_tolerance_still_consensus() {
        let a = provider_result(
            "a",
            &[("brand", json!("Kohler")), ("width", json!(30))],
            0.9,
        );
        let b = provider_result(
            "b",
            &[("brand", json!("KOHLER")), ("width", json!(30.2))],
            0.9,
        );

        let set = build_field_consensus(&a, &b, &config());
        assert!(set
            .fields
            .values()
            .all(|c| c.source == ConsensusSource::Consensus));
        // Provider A's rendering wins
        assert_eq!(set.fields["brand"].final_value, Some(json!("Kohler")));
    }

    #[test]
    fn test_single_source_accepted_above_threshold() {
        let a = provider_result("a", &[("brand", json!("Kohler"))], 0.95);
        let b = provider_result("b", &[], 0.95);

        let set = build_field_consensus(&a, &b, &config());
        let consensus = &set.fields["brand"];
        assert_eq!(consensus.source, ConsensusSource::ProviderAOnly);
        assert_eq!(consensus.final_value, Some(json!("Kohler")));
        assert!(!consensus.is_unresolved());
    }

    #[test]
    fn test_single_source_rejected_below_threshold() {
        let a = provider_result("a", &[("brand", json!("Kohler"))], 0.5);
        let b = provider_result("b", &[], 0.95);

        let set = build_field_consensus(&a, &b, &config());
        assert_eq!(set.fields["brand"].source, ConsensusSource::Unresolved);
        assert!(set.fields["brand"].final_value.is_none());
    }

    #[test]
    fn test_arbitration_by_confidence_margin() {
        let a = provider_result("a", &[("finish", json!("Brushed Nickel"))], 0.95);
        let b = provider_result("b", &[("finish", json!("Chrome"))], 0.6);

        let set = build_field_consensus(&a, &b, &config());
        let consensus = &set.fields["finish"];
        assert!(!consensus.agreed);
        assert_eq!(consensus.source, ConsensusSource::ProviderAOnly);
        assert_eq!(consensus.final_value, Some(json!("Brushed Nickel")));

        // The discrepancy is recorded but resolved
        let discrepancies = set.discrepancies();
        assert_eq!(discrepancies.len(), 1);
        assert!(discrepancies[0].resolved);
        assert_eq!(
            discrepancies[0].resolution_source.as_deref(),
            Some("provider_a")
        );
    }

    #[test]
    fn test_arbitration_needs_margin_and_accept_bar() {
        // 0.1 lead is under the 0.15 margin
        let a = provider_result("a", &[("finish", json!("Brushed Nickel"))], 0.95);
        let b = provider_result("b", &[("finish", json!("Chrome"))], 0.85);
        let set = build_field_consensus(&a, &b, &config());
        assert_eq!(set.fields["finish"].source, ConsensusSource::Unresolved);

        // Clear lead, but winner is below the accept bar
        let a = provider_result("a", &[("finish", json!("Brushed Nickel"))], 0.6);
        let b = provider_result("b", &[("finish", json!("Chrome"))], 0.3);
        let set = build_field_consensus(&a, &b, &config());
        assert_eq!(set.fields["finish"].source, ConsensusSource::Unresolved);
        assert!(set.has_unresolved());
    }

    #[test]
    fn test_mutually_missing_goes_to_research() {
        let mut a = provider_result("a", &[("brand", json!("Kohler"))], 0.95);
        let mut b = provider_result("b", &[("brand", json!("Kohler"))], 0.95);
        a.missing_fields.insert("upc".to_string());
        b.missing_fields.insert("upc".to_string());

        let set = build_field_consensus(&a, &b, &config());
        assert!(set.needs_research.contains("upc"));
        assert!(!set.fields.contains_key("upc"));
        assert!(set.discrepancies().is_empty());
    }

    #[test]
    fn test_one_sided_missing_is_not_research() {
        let mut a = provider_result("a", &[("brand", json!("Kohler"))], 0.95);
        let b = provider_result("b", &[("brand", json!("Kohler"))], 0.95);
        a.missing_fields.insert("upc".to_string());

        let set = build_field_consensus(&a, &b, &config());
        assert!(!set.needs_research.contains("upc"));
    }

    #[test]
    fn test_unknown_literal_treated_as_absent() {
        let a = provider_result("a", &[("upc", json!("unknown"))], 0.95);
        let b = provider_result("b", &[("upc", json!("Unknown"))], 0.95);

        let set = build_field_consensus(&a, &b, &config());
        assert!(set.needs_research.contains("upc"));
        assert!(!set.fields.contains_key("upc"));
    }

    #[test]
    fn test_unknown_on_one_side_single_source() {
        let a = provider_result("a", &[("upc", json!("unknown"))], 0.95);
        let b = provider_result("b", &[("upc", json!("012345678905"))], 0.95);

        let set = build_field_consensus(&a, &b, &config());
        assert_eq!(set.fields["upc"].source, ConsensusSource::ProviderBOnly);
        assert_eq!(set.fields["upc"].final_value, Some(json!("012345678905")));
    }

    #[test]
    fn test_merged_fields_skips_unresolved() {
        let a = provider_result(
            "a",
            &[("brand", json!("Kohler")), ("finish", json!("Chrome"))],
            0.85,
        );
        let b = provider_result(
            "b",
            &[("brand", json!("Kohler")), ("finish", json!("Brass"))],
            0.85,
        );

        let set = build_field_consensus(&a, &b, &config());
        let merged = set.merged_fields();
        assert_eq!(merged.len(), 1);
        assert!(merged.contains_key("brand"));
    }

    #[test]
    fn test_per_field_confidence_overrides_overall() {
        let mut a = provider_result("a", &[("finish", json!("Brushed Nickel"))], 0.5);
        a.field_confidence.insert("finish".to_string(), 0.95);
        let b = provider_result("b", &[("finish", json!("Chrome"))], 0.6);

        let set = build_field_consensus(&a, &b, &config());
        assert_eq!(set.fields["finish"].source, ConsensusSource::ProviderAOnly);
    }
}
