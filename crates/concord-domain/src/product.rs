//! Raw product input

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field value as returned by a provider.
///
/// Providers emit type-heterogeneous data (strings, numbers, booleans,
/// lists, nested maps), so the domain carries values as JSON.
pub type FieldValue = serde_json::Value;

/// An untyped product record as supplied by the raw product source.
///
/// The `data` bag is whatever the upstream system had on file; nothing in it
/// is trusted. The optional category hint is advisory only — each provider
/// determines the category independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    /// Caller-supplied product identifier
    pub id: String,

    /// Arbitrary key/value bag of raw attribute data
    pub data: BTreeMap<String, FieldValue>,

    /// Optional category hint from the source system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_hint: Option<String>,
}

impl RawProduct {
    /// Create a product from an id and raw data
    pub fn new(id: impl Into<String>, data: BTreeMap<String, FieldValue>) -> Self {
        Self {
            id: id.into(),
            data,
            category_hint: None,
        }
    }

    /// Attach a category hint
    pub fn with_category_hint(mut self, hint: impl Into<String>) -> Self {
        self.category_hint = Some(hint.into());
        self
    }

    /// Fetch a raw field as a string, if present and textual
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(|v| v.as_str())
    }
}
