//! The inference provider contract

use async_trait::async_trait;
use concord_domain::{AttributeSchema, ProviderResult, RawProduct, RetryContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One provider's category determination, shared with the other provider
/// during cross-validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerAssessment {
    /// Which provider produced the assessment
    pub provider_id: String,

    /// The category that provider determined
    pub category: String,

    /// That provider's confidence in the category [0.0, 1.0]
    pub category_confidence: f64,
}

/// A targeted request for fields neither provider could populate.
///
/// Deliberately carries only identifying facts (brand/model/category) and
/// the missing field names, not the original noisy data, so the provider
/// answers from general domain knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRequest {
    /// Product being researched
    pub product_id: String,

    /// Brand, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Model/part number, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Agreed category
    pub category: String,

    /// Fields to research
    pub missing_fields: BTreeSet<String>,
}

/// Contract for an inference provider.
///
/// Implementations must never fail at the Rust level: network, timeout and
/// parse problems are encoded as `ProviderResult { success: false, error }`
/// so the consensus pipeline has a single result shape to reason about.
/// Implementations are stateless across invocations; handles are passed
/// into the controller at construction, so tests substitute doubles freely.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Stable identifier for this provider
    fn id(&self) -> &str;

    /// Categorize a product and map its raw fields into the schema.
    ///
    /// `retry` carries the previous attempt's disagreements when this is a
    /// re-invocation.
    async fn submit(
        &self,
        product: &RawProduct,
        schema: &AttributeSchema,
        retry: Option<&RetryContext>,
    ) -> ProviderResult;

    /// Re-assess a product given the other provider's category determination
    async fn cross_validate(
        &self,
        product: &RawProduct,
        schema: &AttributeSchema,
        peer: &PeerAssessment,
    ) -> ProviderResult;

    /// Fill missing fields from general domain knowledge
    async fn research(&self, request: &ResearchRequest) -> ProviderResult;
}
