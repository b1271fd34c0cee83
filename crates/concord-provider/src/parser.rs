//! Resilient recovery of provider responses
//!
//! Provider responses are free text expected to contain a JSON object but
//! not guaranteed to be valid JSON. Recovery runs an ordered list of pure
//! parsing strategies, strict to lenient, stopping at the first success:
//!
//! 1. direct parse of the full text
//! 2. first fenced code block
//! 3. first balanced `{...}` substring
//! 4. the same substring after repair (trailing commas, control
//!    characters, `//` comment lines)
//! 5. regex scrape of individually named fields into a degraded partial
//!    payload
//!
//! A recovered payload is accepted only if it exposes a category, a
//! primary-attribute map, a filter-attribute map and a confidence value
//! under one of the accepted key spellings; otherwise the response
//! surfaces as `success: false`.

use concord_domain::{
    Correction, CorrectionSource, FieldValue, ProviderFailureKind, ProviderResult,
};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Accepted key spellings, per payload element
const CATEGORY_KEYS: &[&str] = &["category", "product_category", "determined_category"];
const PRIMARY_KEYS: &[&str] = &["attributes", "primary_attributes", "global_attributes"];
const FILTER_KEYS: &[&str] = &["filter_attributes", "filters", "category_attributes"];
const CONFIDENCE_KEYS: &[&str] = &["confidence", "overall_confidence", "confidence_score"];

/// Ordered non-degraded recovery strategies
const STRATEGIES: &[(&str, fn(&str) -> Option<Value>)] = &[
    ("direct", parse_direct),
    ("fenced_block", parse_fenced_block),
    ("balanced_object", parse_balanced_object),
    ("repaired_object", parse_repaired_object),
];

/// Parse a provider's response text into a typed result.
///
/// Never fails at the Rust level; unrecoverable or unacceptable responses
/// come back as `success: false` with `Parse`/`Rejected` failure kinds.
pub fn parse_response(provider_id: &str, text: &str) -> ProviderResult {
    for (name, strategy) in STRATEGIES {
        if let Some(payload) = strategy(text) {
            debug!(provider = provider_id, strategy = name, "response recovered");
            return match payload_to_result(provider_id, &payload, false) {
                Ok(result) => result,
                Err(reason) => {
                    warn!(provider = provider_id, reason, "payload rejected");
                    ProviderResult::failure(provider_id, ProviderFailureKind::Rejected, reason)
                }
            };
        }
    }

    // Last resort: scrape named fields into a degraded partial payload
    if let Some(payload) = scrape_fields(text) {
        warn!(provider = provider_id, "response degraded to field scrape");
        if let Ok(result) = payload_to_result(provider_id, &payload, true) {
            return result;
        }
    }

    ProviderResult::failure(
        provider_id,
        ProviderFailureKind::Parse,
        "no strategy recovered a JSON object",
    )
}

fn parse_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok().filter(Value::is_object)
}

/// Extract the first fenced code block (``` or ```json) and parse it
fn parse_fenced_block(text: &str) -> Option<Value> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the language tag on the opening line
    let body_start = after_fence.find('\n')?;
    let body = &after_fence[body_start + 1..];
    let close = body.find("```")?;
    serde_json::from_str(body[..close].trim())
        .ok()
        .filter(Value::is_object)
}

fn parse_balanced_object(text: &str) -> Option<Value> {
    let candidate = extract_balanced_object(text)?;
    serde_json::from_str(candidate).ok()
}

fn parse_repaired_object(text: &str) -> Option<Value> {
    let candidate = extract_balanced_object(text)?;
    serde_json::from_str(&repair_json(candidate)).ok()
}

/// Find the first balanced `{...}` substring, honoring string literals
fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("static regex"));

/// Strip `//` comment lines, control characters and trailing commas
fn repair_json(text: &str) -> String {
    let without_comments: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n");

    let without_control: String = without_comments
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();

    TRAILING_COMMA_RE
        .replace_all(&without_control, "$1")
        .into_owned()
}

static SCRAPE_CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:product_|determined_)?category"\s*:\s*"([^"]+)""#).expect("static regex")
});
static SCRAPE_CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:overall_)?confidence(?:_score)?"\s*:\s*([0-9]*\.?[0-9]+)"#)
        .expect("static regex")
});
static SCRAPE_BRAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""brand"\s*:\s*"([^"]+)""#).expect("static regex"));
static SCRAPE_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title"\s*:\s*"([^"]+)""#).expect("static regex"));

/// Scrape individually named fields from otherwise unrecoverable text
fn scrape_fields(text: &str) -> Option<Value> {
    let category = SCRAPE_CATEGORY_RE
        .captures(text)
        .map(|c| c[1].to_string())?;
    let confidence: f64 = SCRAPE_CONFIDENCE_RE
        .captures(text)
        .and_then(|c| c[1].parse().ok())?;

    let mut attributes = serde_json::Map::new();
    if let Some(c) = SCRAPE_BRAND_RE.captures(text) {
        attributes.insert("brand".to_string(), Value::String(c[1].to_string()));
    }
    if let Some(c) = SCRAPE_TITLE_RE.captures(text) {
        attributes.insert("title".to_string(), Value::String(c[1].to_string()));
    }

    Some(serde_json::json!({
        "category": category,
        "confidence": confidence,
        "attributes": attributes,
        "filter_attributes": {},
    }))
}

fn lookup<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| payload.get(*k))
}

/// Validate a recovered payload and convert it into a `ProviderResult`.
///
/// Degraded payloads (from the scrape strategy) are exempt from the
/// attribute-map requirement; everything else must expose all four
/// elements.
fn payload_to_result(
    provider_id: &str,
    payload: &Value,
    degraded: bool,
) -> Result<ProviderResult, String> {
    let category = lookup(payload, CATEGORY_KEYS)
        .and_then(Value::as_str)
        .ok_or("missing category")?
        .to_string();

    let overall_confidence = lookup(payload, CONFIDENCE_KEYS)
        .and_then(Value::as_f64)
        .ok_or("missing confidence")?
        .clamp(0.0, 1.0);

    let primary = lookup(payload, PRIMARY_KEYS).and_then(Value::as_object);
    let filter = lookup(payload, FILTER_KEYS).and_then(Value::as_object);
    if !degraded && (primary.is_none() || filter.is_none()) {
        return Err("missing attribute maps".to_string());
    }

    // Primary attributes are authoritative on key collision
    let mut fields: BTreeMap<String, FieldValue> = BTreeMap::new();
    for map in [primary, filter].into_iter().flatten() {
        for (key, value) in map {
            fields.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    let category_confidence = payload
        .get("category_confidence")
        .and_then(Value::as_f64)
        .unwrap_or(overall_confidence)
        .clamp(0.0, 1.0);

    let field_confidence: BTreeMap<String, f64> = payload
        .get("field_confidence")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_f64().map(|c| (k.clone(), c.clamp(0.0, 1.0))))
                .collect()
        })
        .unwrap_or_default();

    let missing_fields: BTreeSet<String> = payload
        .get("missing_fields")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let corrections = payload
        .get("corrections")
        .and_then(Value::as_array)
        .map(|a| parse_corrections(provider_id, a))
        .unwrap_or_default();

    Ok(ProviderResult {
        provider_id: provider_id.to_string(),
        success: true,
        determined_category: Some(category),
        category_confidence,
        fields,
        field_confidence,
        missing_fields,
        corrections,
        overall_confidence,
        degraded,
        error: None,
    })
}

fn parse_corrections(provider_id: &str, entries: &[Value]) -> Vec<Correction> {
    let mut corrections = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        let Some(field) = entry.get("field").and_then(Value::as_str) else {
            warn!(provider = provider_id, idx, "correction missing field name");
            continue;
        };
        let Some(corrected) = entry
            .get("corrected_value")
            .or_else(|| entry.get("corrected"))
        else {
            warn!(provider = provider_id, idx, "correction missing corrected value");
            continue;
        };
        corrections.push(Correction {
            field: field.to_string(),
            original_value: entry
                .get("original_value")
                .or_else(|| entry.get("original"))
                .cloned()
                .unwrap_or(Value::Null),
            corrected_value: corrected.clone(),
            reason: entry
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("provider correction")
                .to_string(),
            source: CorrectionSource::Provider(provider_id.to_string()),
        });
    }
    corrections
}
