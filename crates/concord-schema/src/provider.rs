//! TOML-backed schema provider

use crate::error::SchemaError;
use concord_domain::{AttributeSchema, FieldSpec, FieldType, SchemaProvider, WeightTier};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// Category name used for the global primary-field schema
const GLOBAL_CATEGORY: &str = "global";

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    global: FieldList,

    #[serde(default)]
    categories: HashMap<String, FieldList>,
}

#[derive(Debug, Deserialize)]
struct FieldList {
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    name: String,

    #[serde(rename = "type")]
    field_type: FieldType,

    tier: WeightTier,
}

impl FieldEntry {
    fn to_spec(&self) -> FieldSpec {
        FieldSpec {
            name: self.name.clone(),
            field_type: self.field_type,
            tier: self.tier,
        }
    }
}

/// Attribute schema provider backed by a TOML document.
///
/// The document declares the global primary fields applied to every
/// category plus category-specific filter fields:
///
/// ```toml
/// [global]
/// fields = [
///     { name = "category", type = "text", tier = "primary" },
///     { name = "brand", type = "text", tier = "primary" },
/// ]
///
/// [categories.Bathtubs]
/// fields = [
///     { name = "drain_placement", type = "text", tier = "filter" },
/// ]
/// ```
///
/// Resolved schemas are cached per category. The provider is read-only
/// after construction; the cache lock is never held across I/O.
pub struct TomlSchemaProvider {
    global: Vec<FieldSpec>,
    categories: HashMap<String, Vec<FieldSpec>>,
    cache: RwLock<HashMap<String, AttributeSchema>>,
}

impl TomlSchemaProvider {
    /// Parse a provider from TOML text
    pub fn from_toml(text: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument =
            toml::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Self::from_document(document)
    }

    /// Load a provider from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    fn from_document(document: SchemaDocument) -> Result<Self, SchemaError> {
        if document.global.fields.is_empty() {
            return Err(SchemaError::Invalid(
                "global field list is empty".to_string(),
            ));
        }

        let global: Vec<FieldSpec> = document.global.fields.iter().map(FieldEntry::to_spec).collect();
        validate_unique(GLOBAL_CATEGORY, &global)?;

        let mut categories = HashMap::new();
        for (name, list) in document.categories {
            let mut fields = global.clone();
            fields.extend(list.fields.iter().map(FieldEntry::to_spec));
            validate_unique(&name, &fields)?;
            categories.insert(name, fields);
        }

        debug!(
            global_fields = global.len(),
            categories = categories.len(),
            "schema document loaded"
        );

        Ok(Self {
            global,
            categories,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Names of the configured categories
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(|k| k.as_str()).collect()
    }
}

fn validate_unique(category: &str, fields: &[FieldSpec]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::Invalid(format!(
                "duplicate field '{}' in category '{}'",
                field.name, category
            )));
        }
    }
    Ok(())
}

impl SchemaProvider for TomlSchemaProvider {
    type Error = SchemaError;

    fn schema_for(&self, category: &str) -> Result<AttributeSchema, Self::Error> {
        if let Some(schema) = self.cache.read().expect("cache lock").get(category) {
            return Ok(schema.clone());
        }

        // Unknown categories fall back to the global primary fields
        let fields = self
            .categories
            .get(category)
            .cloned()
            .unwrap_or_else(|| self.global.clone());

        let schema = AttributeSchema {
            category: category.to_string(),
            fields,
        };
        self.cache
            .write()
            .expect("cache lock")
            .insert(category.to_string(), schema.clone());
        Ok(schema)
    }

    fn primary_fields(&self) -> Result<AttributeSchema, Self::Error> {
        Ok(AttributeSchema {
            category: GLOBAL_CATEGORY.to_string(),
            fields: self.global.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCUMENT: &str = r#"
        [global]
        fields = [
            { name = "category", type = "text", tier = "primary" },
            { name = "brand", type = "text", tier = "primary" },
            { name = "title", type = "text", tier = "primary" },
        ]

        [categories.Bathtubs]
        fields = [
            { name = "drain_placement", type = "text", tier = "filter" },
            { name = "soaking_depth", type = "number", tier = "filter" },
        ]
    "#;

    #[test]
    fn test_schema_for_known_category() {
        let provider = TomlSchemaProvider::from_toml(DOCUMENT).unwrap();
        let schema = provider.schema_for("Bathtubs").unwrap();

        assert_eq!(schema.category, "Bathtubs");
        // Global fields come first, then category filters
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(
            names,
            vec!["category", "brand", "title", "drain_placement", "soaking_depth"]
        );
        assert_eq!(schema.tier_for("brand"), WeightTier::Primary);
        assert_eq!(schema.tier_for("drain_placement"), WeightTier::Filter);
    }

    #[test]
    fn test_unknown_category_falls_back_to_global() {
        let provider = TomlSchemaProvider::from_toml(DOCUMENT).unwrap();
        let schema = provider.schema_for("Gazebos").unwrap();

        assert_eq!(schema.fields.len(), 3);
        assert_eq!(schema.category, "Gazebos");
    }

    #[test]
    fn test_cache_returns_equal_schema() {
        let provider = TomlSchemaProvider::from_toml(DOCUMENT).unwrap();
        let first = provider.schema_for("Bathtubs").unwrap();
        let second = provider.schema_for("Bathtubs").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_primary_fields() {
        let provider = TomlSchemaProvider::from_toml(DOCUMENT).unwrap();
        let schema = provider.primary_fields().unwrap();
        assert_eq!(schema.category, "global");
        assert_eq!(schema.fields.len(), 3);
    }

    #[test]
    fn test_empty_global_rejected() {
        let result = TomlSchemaProvider::from_toml("[global]\nfields = []");
        assert!(matches!(result, Err(SchemaError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let document = r#"
            [global]
            fields = [
                { name = "brand", type = "text", tier = "primary" },
                { name = "brand", type = "text", tier = "primary" },
            ]
        "#;
        let result = TomlSchemaProvider::from_toml(document);
        assert!(matches!(result, Err(SchemaError::Invalid(_))));
    }

    #[test]
    fn test_malformed_document_rejected() {
        let result = TomlSchemaProvider::from_toml("not toml at all [[[");
        assert!(matches!(result, Err(SchemaError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let provider = TomlSchemaProvider::from_file(file.path()).unwrap();
        assert!(provider.schema_for("Bathtubs").is_ok());
        assert_eq!(provider.category_names(), vec!["Bathtubs"]);
    }
}
