//! Attribute schema value objects

use serde::{Deserialize, Serialize};

/// Expected type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text
    Text,

    /// Numeric value
    Number,

    /// True/false flag
    Boolean,

    /// List of values
    List,
}

/// Scoring weight tier of a schema field.
///
/// The verification score weights each field by its tier: primary/global
/// attributes weigh 3, category filter attributes 2, everything else 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTier {
    /// Primary/global attribute (weight 3)
    Primary,

    /// Category-specific filter attribute (weight 2)
    Filter,

    /// Anything else (weight 1)
    Additional,
}

impl WeightTier {
    /// Numeric weight used by the verification score
    pub fn weight(&self) -> u32 {
        match self {
            WeightTier::Primary => 3,
            WeightTier::Filter => 2,
            WeightTier::Additional => 1,
        }
    }
}

/// One field of a category's attribute schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Canonical field name
    pub name: String,

    /// Expected value type
    pub field_type: FieldType,

    /// Scoring weight tier
    pub tier: WeightTier,
}

/// The canonical attribute schema for one category.
///
/// Read-only for the lifetime of a run; the schema provider caches these
/// per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSchema {
    /// Category this schema describes
    pub category: String,

    /// Ordered field specifications: primary/global fields first, then
    /// category filter fields
    pub fields: Vec<FieldSpec>,
}

impl AttributeSchema {
    /// Look up a field's spec by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Weight tier for a field; fields outside the schema are Additional
    pub fn tier_for(&self, name: &str) -> WeightTier {
        self.field(name)
            .map(|f| f.tier)
            .unwrap_or(WeightTier::Additional)
    }

    /// Names of all schema fields, in schema order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> AttributeSchema {
        AttributeSchema {
            category: "Bathtubs".to_string(),
            fields: vec![
                FieldSpec {
                    name: "brand".to_string(),
                    field_type: FieldType::Text,
                    tier: WeightTier::Primary,
                },
                FieldSpec {
                    name: "drain_placement".to_string(),
                    field_type: FieldType::Text,
                    tier: WeightTier::Filter,
                },
            ],
        }
    }

    #[test]
    fn test_tier_weights() {
        assert_eq!(WeightTier::Primary.weight(), 3);
        assert_eq!(WeightTier::Filter.weight(), 2);
        assert_eq!(WeightTier::Additional.weight(), 1);
    }

    #[test]
    fn test_tier_for_unknown_field_is_additional() {
        let schema = schema();
        assert_eq!(schema.tier_for("brand"), WeightTier::Primary);
        assert_eq!(schema.tier_for("drain_placement"), WeightTier::Filter);
        assert_eq!(schema.tier_for("upc"), WeightTier::Additional);
    }

    #[test]
    fn test_field_lookup() {
        let schema = schema();
        assert!(schema.field("brand").is_some());
        assert!(schema.field("nonexistent").is_none());
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(names, vec!["brand", "drain_placement"]);
    }
}
