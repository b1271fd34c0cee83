//! Concord Provider Layer
//!
//! Implementations of the [`InferenceProvider`] contract: the boundary
//! between the reconciliation engine and the two semantic-inference
//! services it consults.
//!
//! # Architecture
//!
//! The adapter contract never fails at the Rust level. Timeouts, transport
//! problems and unparseable output all come back as
//! `ProviderResult { success: false, error }`, so the consensus pipeline
//! has exactly one result shape to reason about. Provider handles are
//! plain values passed into the controller at construction; there are no
//! shared client singletons.
//!
//! # Providers
//!
//! - [`MockProvider`]: scripted double for tests
//! - [`HttpProvider`]: JSON-over-HTTP inference service integration
//!
//! # Examples
//!
//! ```
//! use concord_provider::MockProvider;
//! use concord_domain::{ProviderFailureKind, ProviderResult};
//!
//! let provider = MockProvider::new(
//!     "provider-a",
//!     ProviderResult::failure("provider-a", ProviderFailureKind::Timeout, "scripted"),
//! );
//! assert_eq!(provider.submit_calls(), 0);
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod http;
pub mod parser;

use concord_domain::{ProviderResult, RetryContext};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use adapter::{InferenceProvider, PeerAssessment, ResearchRequest};
pub use http::HttpProvider;
pub use parser::parse_response;

/// Errors constructing a provider handle
///
/// Runtime failures never surface here; they are encoded in
/// `ProviderResult` per the adapter contract.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The endpoint URL is not usable
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Scripted inference provider for deterministic testing
///
/// Responses are queued per operation and popped in order; when a queue is
/// empty the configured default result is returned. Call counters and the
/// last seen retry context are shared across clones so a test can hand the
/// provider to the engine and still observe it.
#[derive(Debug, Clone)]
pub struct MockProvider {
    id: String,
    default_result: ProviderResult,
    submit_queue: Arc<Mutex<VecDeque<ProviderResult>>>,
    cross_validate_queue: Arc<Mutex<VecDeque<ProviderResult>>>,
    research_queue: Arc<Mutex<VecDeque<ProviderResult>>>,
    submit_calls: Arc<Mutex<usize>>,
    cross_validate_calls: Arc<Mutex<usize>>,
    research_calls: Arc<Mutex<usize>>,
    last_retry_context: Arc<Mutex<Option<RetryContext>>>,
}

impl MockProvider {
    /// Create a mock that answers every call with `default_result`
    pub fn new(id: impl Into<String>, default_result: ProviderResult) -> Self {
        Self {
            id: id.into(),
            default_result,
            submit_queue: Arc::new(Mutex::new(VecDeque::new())),
            cross_validate_queue: Arc::new(Mutex::new(VecDeque::new())),
            research_queue: Arc::new(Mutex::new(VecDeque::new())),
            submit_calls: Arc::new(Mutex::new(0)),
            cross_validate_calls: Arc::new(Mutex::new(0)),
            research_calls: Arc::new(Mutex::new(0)),
            last_retry_context: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue a result for the next `submit` call
    pub fn push_submit(&self, result: ProviderResult) {
        self.submit_queue.lock().unwrap().push_back(result);
    }

    /// Queue a raw response text for the next `submit` call, routed
    /// through the resilient parser exactly as a live provider's output
    /// would be
    pub fn push_raw_submit(&self, text: &str) {
        self.push_submit(parser::parse_response(&self.id, text));
    }

    /// Queue a result for the next `cross_validate` call
    pub fn push_cross_validate(&self, result: ProviderResult) {
        self.cross_validate_queue.lock().unwrap().push_back(result);
    }

    /// Queue a result for the next `research` call
    pub fn push_research(&self, result: ProviderResult) {
        self.research_queue.lock().unwrap().push_back(result);
    }

    /// Number of `submit` invocations so far
    pub fn submit_calls(&self) -> usize {
        *self.submit_calls.lock().unwrap()
    }

    /// Number of `cross_validate` invocations so far
    pub fn cross_validate_calls(&self) -> usize {
        *self.cross_validate_calls.lock().unwrap()
    }

    /// Number of `research` invocations so far
    pub fn research_calls(&self) -> usize {
        *self.research_calls.lock().unwrap()
    }

    /// The retry context most recently passed to `submit`, if any
    pub fn last_retry_context(&self) -> Option<RetryContext> {
        self.last_retry_context.lock().unwrap().clone()
    }

    fn pop_or_default(&self, queue: &Mutex<VecDeque<ProviderResult>>) -> ProviderResult {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_result.clone())
    }
}

#[async_trait::async_trait]
impl InferenceProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit(
        &self,
        _product: &concord_domain::RawProduct,
        _schema: &concord_domain::AttributeSchema,
        retry: Option<&RetryContext>,
    ) -> ProviderResult {
        *self.submit_calls.lock().unwrap() += 1;
        *self.last_retry_context.lock().unwrap() = retry.cloned();
        self.pop_or_default(&self.submit_queue)
    }

    async fn cross_validate(
        &self,
        _product: &concord_domain::RawProduct,
        _schema: &concord_domain::AttributeSchema,
        _peer: &PeerAssessment,
    ) -> ProviderResult {
        *self.cross_validate_calls.lock().unwrap() += 1;
        self.pop_or_default(&self.cross_validate_queue)
    }

    async fn research(&self, _request: &ResearchRequest) -> ProviderResult {
        *self.research_calls.lock().unwrap() += 1;
        self.pop_or_default(&self.research_queue)
    }
}
