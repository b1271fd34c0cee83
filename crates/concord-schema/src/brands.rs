//! Brand picklist and text cleaning
//!
//! Upstream CRM picklists accumulate damage: entries truncated mid-word,
//! HTML entities left over from web scraping (`&amp;` for `&`), stray
//! control characters and doubled whitespace. Provider output inherits the
//! same artifacts from the raw data it was shown. The cleaner normalizes
//! string values before they reach the consensus builder, so two providers
//! that only differ in entity encoding still count as agreeing, and each
//! change is recorded as a correction attributed to the text cleaner.

use concord_domain::{Correction, CorrectionSource, FieldValue};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// HTML entities seen in scraped product data
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
];

/// Canonical brand names, looked up case-insensitively
#[derive(Debug, Clone, Default)]
pub struct BrandPicklist {
    // normalized lowercase -> canonical spelling
    brands: BTreeMap<String, String>,
}

impl BrandPicklist {
    /// Build a picklist from canonical brand names
    pub fn new(brands: impl IntoIterator<Item = String>) -> Self {
        let brands = brands
            .into_iter()
            .map(|canonical| (normalize_key(&canonical), canonical))
            .collect();
        Self { brands }
    }

    /// Load a picklist from a JSON array of brand names
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let names: Vec<String> = serde_json::from_str(&text)
            .map_err(|e| format!("brand picklist is not a JSON string array: {}", e))?;
        debug!(entries = names.len(), "brand picklist loaded");
        Ok(Self::new(names))
    }

    /// Canonical spelling for a brand, if the picklist knows it
    pub fn canonical(&self, brand: &str) -> Option<&str> {
        self.brands
            .get(&normalize_key(brand))
            .map(|s| s.as_str())
    }

    /// Number of known brands
    pub fn len(&self) -> usize {
        self.brands.len()
    }

    /// Whether the picklist is empty
    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }
}

fn normalize_key(brand: &str) -> String {
    clean_text(brand).to_lowercase()
}

/// Normalize a string value: decode HTML entities, drop control
/// characters, collapse whitespace runs, trim.
pub fn clean_text(text: &str) -> String {
    let mut decoded = text.to_string();
    for (entity, replacement) in HTML_ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    // Whitespace controls survive here; the collapse below folds them
    let without_control: String = decoded
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    without_control.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean every string value in a field map.
///
/// Returns the cleaned map plus one `TextCleaner` correction per changed
/// value. The `brand` field is additionally rewritten to its picklist
/// canonical spelling when one is known.
pub fn clean_fields(
    fields: &BTreeMap<String, FieldValue>,
    picklist: Option<&BrandPicklist>,
) -> (BTreeMap<String, FieldValue>, Vec<Correction>) {
    let mut cleaned = BTreeMap::new();
    let mut corrections = Vec::new();

    for (name, value) in fields {
        let new_value = match value.as_str() {
            Some(text) => {
                let mut result = clean_text(text);
                if name == "brand" {
                    if let Some(canonical) = picklist.and_then(|p| p.canonical(&result)) {
                        result = canonical.to_string();
                    }
                }
                FieldValue::String(result)
            }
            None => value.clone(),
        };

        if new_value != *value {
            corrections.push(Correction {
                field: name.clone(),
                original_value: value.clone(),
                corrected_value: new_value.clone(),
                reason: if name == "brand" {
                    "normalized brand text".to_string()
                } else {
                    "normalized text value".to_string()
                },
                source: CorrectionSource::TextCleaner,
            });
        }
        cleaned.insert(name.clone(), new_value);
    }

    (cleaned, corrections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_clean_text_entities_and_whitespace() {
        assert_eq!(
            clean_text("DCS by FISHER &amp; PAYKEL"),
            "DCS by FISHER & PAYKEL"
        );
        assert_eq!(clean_text("  Mountain\tPlumbing   Products \n"), "Mountain Plumbing Products");
        assert_eq!(clean_text("It&#39;s &quot;fine&quot;"), "It's \"fine\"");
    }

    #[test]
    fn test_clean_text_strips_control_chars() {
        assert_eq!(clean_text("Koh\u{0000}ler\u{0007}"), "Kohler");
    }

    #[test]
    fn test_picklist_case_insensitive_lookup() {
        let picklist = BrandPicklist::new(vec![
            "Kohler".to_string(),
            "CHARLOTTE PIPE AND FOUNDRY".to_string(),
        ]);

        assert_eq!(picklist.canonical("KOHLER"), Some("Kohler"));
        assert_eq!(
            picklist.canonical("charlotte pipe and foundry"),
            Some("CHARLOTTE PIPE AND FOUNDRY")
        );
        assert_eq!(picklist.canonical("Moen"), None);
    }

    #[test]
    fn test_picklist_matches_damaged_input() {
        let picklist = BrandPicklist::new(vec!["Fisher & Paykel".to_string()]);
        // Entity-damaged input still resolves to the canonical entry
        assert_eq!(
            picklist.canonical("Fisher &amp; Paykel"),
            Some("Fisher & Paykel")
        );
    }

    #[test]
    fn test_clean_fields_emits_corrections() {
        let picklist = BrandPicklist::new(vec!["Kohler".to_string()]);
        let mut fields = BTreeMap::new();
        fields.insert("brand".to_string(), json!("KOHLER  "));
        fields.insert("title".to_string(), json!("Tub &amp; Shower Kit"));
        fields.insert("width".to_string(), json!(30));

        let (cleaned, corrections) = clean_fields(&fields, Some(&picklist));

        assert_eq!(cleaned["brand"], json!("Kohler"));
        assert_eq!(cleaned["title"], json!("Tub & Shower Kit"));
        assert_eq!(cleaned["width"], json!(30));
        assert_eq!(corrections.len(), 2);
        assert!(corrections
            .iter()
            .all(|c| c.source == CorrectionSource::TextCleaner));
    }

    #[test]
    fn test_clean_fields_no_change_no_corrections() {
        let mut fields = BTreeMap::new();
        fields.insert("brand".to_string(), json!("Kohler"));

        let (cleaned, corrections) = clean_fields(&fields, None);
        assert_eq!(cleaned["brand"], json!("Kohler"));
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_picklist_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"["Kohler", "Moen", "Delta Faucet"]"#)
            .unwrap();

        let picklist = BrandPicklist::from_json_file(file.path()).unwrap();
        assert_eq!(picklist.len(), 3);
        assert_eq!(picklist.canonical("moen"), Some("Moen"));
    }

    #[test]
    fn test_picklist_from_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"not\": \"an array\"}").unwrap();
        assert!(BrandPicklist::from_json_file(file.path()).is_err());
    }
}
