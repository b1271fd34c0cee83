//! HTTP Provider Implementation
//!
//! Talks to a JSON-over-HTTP inference service. The service receives the
//! raw product, the schema's field names and any retry/cross-validation/
//! research context, and answers with free text expected to contain a JSON
//! object, which is recovered by the resilient parser.
//!
//! Per the adapter contract, nothing here returns an error to the caller:
//! every failure mode is encoded into the `ProviderResult`. The per-call
//! timeout on the HTTP client is the only cancellation mechanism.

use crate::adapter::{InferenceProvider, PeerAssessment, ResearchRequest};
use crate::parser::parse_response;
use crate::ProviderError;
use async_trait::async_trait;
use concord_domain::{
    AttributeSchema, ProviderFailureKind, ProviderResult, RawProduct, RetryContext,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for inference requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Inference task selector sent to the service
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum TaskKind {
    Categorize,
    CrossValidate,
    Research,
}

/// Request body for the inference endpoint
#[derive(Serialize)]
struct InferenceRequest<'a> {
    model: &'a str,
    task: TaskKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<&'a RawProduct>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    schema_fields: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry: Option<&'a RetryContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer: Option<&'a PeerAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    research: Option<&'a ResearchRequest>,
}

/// Response body from the inference endpoint
#[derive(Deserialize)]
struct InferenceResponse {
    output: String,
}

/// JSON-over-HTTP inference provider
pub struct HttpProvider {
    id: String,
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl HttpProvider {
    /// Create a provider handle
    ///
    /// # Parameters
    ///
    /// - `id`: stable provider identifier (stamped on every result)
    /// - `endpoint`: service base URL (e.g. "http://localhost:9400")
    /// - `model`: model name the service should run
    pub fn new(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Self::with_timeout(id, endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider handle with a custom per-call timeout
    pub fn with_timeout(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ProviderError::InvalidEndpoint(endpoint));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;

        Ok(Self {
            id: id.into(),
            endpoint,
            model: model.into(),
            client,
        })
    }

    async fn call(&self, request: InferenceRequest<'_>) -> ProviderResult {
        let url = format!("{}/v1/infer", self.endpoint);

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return ProviderResult::failure(
                    &self.id,
                    ProviderFailureKind::Timeout,
                    format!("request timed out: {}", e),
                );
            }
            Err(e) => {
                return ProviderResult::failure(
                    &self.id,
                    ProviderFailureKind::Transport,
                    format!("request failed: {}", e),
                );
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return ProviderResult::failure(
                &self.id,
                ProviderFailureKind::Auth,
                format!("HTTP {}", status),
            );
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return ProviderResult::failure(
                &self.id,
                ProviderFailureKind::Transport,
                format!("HTTP {}: {}", status, body),
            );
        }

        let payload = match response.json::<InferenceResponse>().await {
            Ok(payload) => payload,
            Err(e) => {
                return ProviderResult::failure(
                    &self.id,
                    ProviderFailureKind::Parse,
                    format!("invalid response envelope: {}", e),
                );
            }
        };

        debug!(
            provider = %self.id,
            output_len = payload.output.len(),
            "inference response received"
        );
        parse_response(&self.id, &payload.output)
    }
}

#[async_trait]
impl InferenceProvider for HttpProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit(
        &self,
        product: &RawProduct,
        schema: &AttributeSchema,
        retry: Option<&RetryContext>,
    ) -> ProviderResult {
        self.call(InferenceRequest {
            model: &self.model,
            task: TaskKind::Categorize,
            product: Some(product),
            schema_fields: schema.field_names().collect(),
            retry,
            peer: None,
            research: None,
        })
        .await
    }

    async fn cross_validate(
        &self,
        product: &RawProduct,
        schema: &AttributeSchema,
        peer: &PeerAssessment,
    ) -> ProviderResult {
        self.call(InferenceRequest {
            model: &self.model,
            task: TaskKind::CrossValidate,
            product: Some(product),
            schema_fields: schema.field_names().collect(),
            retry: None,
            peer: Some(peer),
            research: None,
        })
        .await
    }

    async fn research(&self, request: &ResearchRequest) -> ProviderResult {
        self.call(InferenceRequest {
            model: &self.model,
            task: TaskKind::Research,
            product: None,
            schema_fields: Vec::new(),
            retry: None,
            peer: None,
            research: Some(request),
        })
        .await
    }
}
