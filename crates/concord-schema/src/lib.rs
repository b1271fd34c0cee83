//! Concord Schema Layer
//!
//! Infrastructure for the attribute-schema boundary:
//!
//! - [`TomlSchemaProvider`]: category schemas loaded from a TOML document,
//!   cached per category, read-only for the lifetime of a run
//! - [`BrandPicklist`] and the text cleaner: canonicalization of damaged
//!   string values (truncated picklist entries, HTML-entity artifacts)
//!   before they reach the consensus builder

#![warn(missing_docs)]

pub mod brands;
pub mod error;
pub mod provider;

pub use brands::{clean_fields, clean_text, BrandPicklist};
pub use error::SchemaError;
pub use provider::TomlSchemaProvider;
