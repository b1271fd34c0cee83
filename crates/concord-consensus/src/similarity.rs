//! Type-aware value similarity
//!
//! Providers return type-heterogeneous JSON, so comparison dispatches on
//! the value pair's types. All scores are in [0.0, 1.0].

use concord_domain::{FieldValue, ProviderResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Weight of field-name overlap in the aggregate score
const FIELD_OVERLAP_WEIGHT: f64 = 0.3;

/// Weight of per-value agreement in the aggregate score
const VALUE_AGREEMENT_WEIGHT: f64 = 0.7;

/// Compare two field values, returning a similarity in [0.0, 1.0].
///
/// Rules, in order:
/// - both null → 1.0; exactly one null → 0.0
/// - strings: case-insensitive normalized Levenshtein similarity
/// - numbers: `max(0, 1 - |a-b| / max(|a|,|b|))`, with both-zero a match
/// - booleans: exact equality
/// - arrays: positional pairwise comparison averaged over the longer
///   length, so missing tail positions score 0
/// - objects: average over the union of keys, an absent key comparing
///   against null
/// - mismatched types: stringify both and apply the string rule
pub fn compare_values(a: &FieldValue, b: &FieldValue) -> f64 {
    match (a, b) {
        (FieldValue::Null, FieldValue::Null) => 1.0,
        (FieldValue::Null, _) | (_, FieldValue::Null) => 0.0,
        (FieldValue::String(x), FieldValue::String(y)) => string_similarity(x, y),
        (FieldValue::Number(x), FieldValue::Number(y)) => number_similarity(
            x.as_f64().unwrap_or(f64::NAN),
            y.as_f64().unwrap_or(f64::NAN),
        ),
        (FieldValue::Bool(x), FieldValue::Bool(y)) => {
            if x == y {
                1.0
            } else {
                0.0
            }
        }
        (FieldValue::Array(x), FieldValue::Array(y)) => array_similarity(x, y),
        (FieldValue::Object(x), FieldValue::Object(y)) => {
            let keys: BTreeSet<&str> = x.keys().chain(y.keys()).map(|k| k.as_str()).collect();
            if keys.is_empty() {
                return 1.0;
            }
            let total: f64 = keys
                .iter()
                .map(|k| {
                    compare_values(
                        x.get(*k).unwrap_or(&FieldValue::Null),
                        y.get(*k).unwrap_or(&FieldValue::Null),
                    )
                })
                .sum();
            total / keys.len() as f64
        }
        // Cross-type: compare the textual renderings
        _ => string_similarity(&stringify(a), &stringify(b)),
    }
}

fn string_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

fn number_similarity(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return 0.0;
    }
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        // Both zero
        return 1.0;
    }
    (1.0 - (a - b).abs() / scale).max(0.0)
}

fn array_similarity(a: &[FieldValue], b: &[FieldValue]) -> f64 {
    let len = a.len().max(b.len());
    if len == 0 {
        return 1.0;
    }
    let total: f64 = (0..len)
        .map(|i| match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) => compare_values(x, y),
            // Missing tail positions count against the score
            _ => 0.0,
        })
        .sum();
    total / len as f64
}

/// Render a value as the text used for cross-type comparison.
///
/// Strings render bare (no surrounding quotes) so `30` vs `"30"` matches.
fn stringify(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Aggregate similarity between two providers' result sets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultSetComparison {
    /// Jaccard similarity of the two field-name sets
    pub field_overlap: f64,

    /// Mean value similarity over fields present in both sets
    pub value_agreement: f64,

    /// `0.3 * field_overlap + 0.7 * value_agreement`
    pub overall_score: f64,
}

/// Compare the field maps of two provider results.
///
/// `value_agreement` is 0.0 when the providers share no fields; two empty
/// result sets count as full field overlap.
pub fn compare_result_sets(a: &ProviderResult, b: &ProviderResult) -> ResultSetComparison {
    let names_a: BTreeSet<&str> = a.fields.keys().map(|k| k.as_str()).collect();
    let names_b: BTreeSet<&str> = b.fields.keys().map(|k| k.as_str()).collect();

    let union = names_a.union(&names_b).count();
    let common: Vec<&str> = names_a.intersection(&names_b).copied().collect();

    let field_overlap = if union == 0 {
        1.0
    } else {
        common.len() as f64 / union as f64
    };

    let value_agreement = if common.is_empty() {
        0.0
    } else {
        let total: f64 = common
            .iter()
            .map(|name| compare_values(&a.fields[*name], &b.fields[*name]))
            .sum();
        total / common.len() as f64
    };

    ResultSetComparison {
        field_overlap,
        value_agreement,
        overall_score: FIELD_OVERLAP_WEIGHT * field_overlap
            + VALUE_AGREEMENT_WEIGHT * value_agreement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn result_with_fields(fields: &[(&str, FieldValue)]) -> ProviderResult {
        ProviderResult {
            provider_id: "test".to_string(),
            success: true,
            determined_category: None,
            category_confidence: 0.0,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
            field_confidence: BTreeMap::new(),
            missing_fields: Default::default(),
            corrections: Vec::new(),
            overall_confidence: 0.9,
            degraded: false,
            error: None,
        }
    }

    #[test]
    fn test_null_rules() {
        assert_eq!(compare_values(&json!(null), &json!(null)), 1.0);
        assert_eq!(compare_values(&json!(null), &json!("x")), 0.0);
        assert_eq!(compare_values(&json!(42), &json!(null)), 0.0);
    }

    #[test]
    fn test_string_case_insensitive() {
        assert_eq!(compare_values(&json!("Kohler"), &json!("KOHLER")), 1.0);
        let sim = compare_values(&json!("Brushed Nickel"), &json!("Brushed Nickle"));
        assert!(sim > 0.85 && sim < 1.0);
    }

    #[test]
    fn test_string_disjoint() {
        let sim = compare_values(&json!("abc"), &json!("xyz"));
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_number_tolerance() {
        let sim = compare_values(&json!(30.0), &json!(30.2));
        assert!(sim > 0.99);
        assert_eq!(compare_values(&json!(0), &json!(0)), 1.0);
        assert_eq!(compare_values(&json!(10), &json!(-10)), 0.0);
    }

    #[test]
    fn test_boolean_equality() {
        assert_eq!(compare_values(&json!(true), &json!(true)), 1.0);
        assert_eq!(compare_values(&json!(true), &json!(false)), 0.0);
    }

    #[test]
    fn test_array_positional() {
        assert_eq!(
            compare_values(&json!(["a", "b"]), &json!(["a", "b"])),
            1.0
        );
        // Missing tail position scores 0: (1 + 0) / 2
        assert_eq!(compare_values(&json!(["a", "b"]), &json!(["a"])), 0.5);
        assert_eq!(compare_values(&json!([]), &json!([])), 1.0);
    }

    #[test]
    fn test_object_union_of_keys() {
        let a = json!({"width": 30, "depth": 20});
        let b = json!({"width": 30});
        // width matches (1.0), depth compares against null (0.0)
        assert_eq!(compare_values(&a, &b), 0.5);
    }

    #[test]
    fn test_cross_type_stringified() {
        assert_eq!(compare_values(&json!(30), &json!("30")), 1.0);
        assert!(compare_values(&json!(true), &json!("true")) == 1.0);
    }

    #[test]
    fn test_result_sets_disjoint_fields() {
        let a = result_with_fields(&[("brand", json!("Kohler"))]);
        let b = result_with_fields(&[("width", json!(30))]);
        let comparison = compare_result_sets(&a, &b);

        assert_eq!(comparison.field_overlap, 0.0);
        assert_eq!(comparison.value_agreement, 0.0);
        assert_eq!(comparison.overall_score, 0.0);
    }

    #[test]
    fn test_result_sets_identical_fields() {
        let fields = [("brand", json!("Kohler")), ("width", json!(30))];
        let a = result_with_fields(&fields);
        let b = result_with_fields(&fields);
        let comparison = compare_result_sets(&a, &b);

        assert_eq!(comparison.field_overlap, 1.0);
        assert_eq!(comparison.value_agreement, 1.0);
        assert!((comparison.overall_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_result_sets_partial_overlap() {
        let a = result_with_fields(&[("brand", json!("Kohler")), ("width", json!(30))]);
        let b = result_with_fields(&[("brand", json!("Kohler")), ("depth", json!(20))]);
        let comparison = compare_result_sets(&a, &b);

        // 1 common of 3 union
        assert!((comparison.field_overlap - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(comparison.value_agreement, 1.0);
    }
}
