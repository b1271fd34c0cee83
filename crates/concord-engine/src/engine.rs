//! Retry/escalation controller
//!
//! Drives one reconciliation run through its states:
//!
//! ```text
//! INITIAL -> (CROSS_VALIDATING)? -> retry loop -> (RESEARCHING)? -> AGREED | ESCALATED
//! ```
//!
//! plus the immediate terminal `FAILED` when both providers fail the
//! initial pass. The two provider calls of an attempt run concurrently and
//! the run suspends until both complete; attempts are strictly sequential
//! with a fixed delay between them. All run state lives in one owned value
//! threaded through the pass sequence; each attempt's consensus supersedes
//! the previous one rather than amending it.

use crate::audit::TracingAuditSink;
use crate::config::EngineConfig;
use crate::error::EngineError;
use concord_consensus::{
    build_field_consensus, compare_result_sets, dedupe_corrections, verification_score,
    FieldConsensusSet,
};
use concord_domain::{
    AttributeSchema, AuditSink, ConsensusResult, ConsensusSource, Correction, FieldConsensus,
    FieldValue, IssueFlag, ProviderFailureKind, ProviderResult, RawProduct, RetryContext, RunId,
    RunOutcome, SchemaProvider,
};
use concord_provider::{InferenceProvider, PeerAssessment, ResearchRequest};
use concord_schema::{clean_fields, BrandPicklist};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Field name under which category agreement participates in scoring
const CATEGORY_FIELD: &str = "category";

/// The reconciliation engine.
///
/// Holds explicit handles to the two inference providers, the schema
/// provider and the audit sink; nothing is shared globally, so tests
/// substitute doubles freely. One `Reconciler` serves any number of
/// sequential runs.
pub struct Reconciler<S: SchemaProvider> {
    provider_a: Arc<dyn InferenceProvider>,
    provider_b: Arc<dyn InferenceProvider>,
    schema_provider: S,
    audit: Arc<dyn AuditSink>,
    picklist: Option<BrandPicklist>,
    config: EngineConfig,
}

/// Mutable state of one run, owned by the pass sequence
struct RunState {
    result_a: ProviderResult,
    result_b: ProviderResult,
    consensus: FieldConsensusSet,
    cleaner_corrections: Vec<Correction>,
    flags: Vec<IssueFlag>,
    /// Audit pass counter: initial, cross-validation, retries and research
    /// all count
    pass: u32,
    retry_count: u32,
}

impl RunState {
    fn flag(&mut self, flag: IssueFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }
}

impl<S> Reconciler<S>
where
    S: SchemaProvider,
    S::Error: Display,
{
    /// Create a reconciler over two provider handles
    pub fn new(
        provider_a: Arc<dyn InferenceProvider>,
        provider_b: Arc<dyn InferenceProvider>,
        schema_provider: S,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        Ok(Self {
            provider_a,
            provider_b,
            schema_provider,
            audit: Arc::new(TracingAuditSink),
            picklist: None,
            config,
        })
    }

    /// Replace the audit sink
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Attach a brand picklist for the text cleaning pass
    pub fn with_brand_picklist(mut self, picklist: BrandPicklist) -> Self {
        self.picklist = Some(picklist);
        self
    }

    /// The engine configuration in effect
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconcile one product into a single merged, scored record.
    ///
    /// Provider failures, disagreements and research gaps are all resolved
    /// into fields of the returned `ConsensusResult`; only schema
    /// resolution problems and internal errors surface as `Err`, fatal to
    /// this run only.
    pub async fn reconcile(&self, product: &RawProduct) -> Result<ConsensusResult, EngineError> {
        let submit_schema = self.resolve_schema(product.category_hint.as_deref())?;

        info!(
            product = %product.id,
            hint = product.category_hint.as_deref().unwrap_or("-"),
            "starting reconciliation"
        );

        let mut state = self.initial_pass(product, &submit_schema).await;

        // Both providers down is terminal; retrying a hard outage would
        // only burn the budget
        if !state.result_a.success && !state.result_b.success {
            state.flag(IssueFlag::AiError);
            state.flag(IssueFlag::ConsensusFailure);
            return Ok(self.finalize_failed(product, state));
        }
        if !state.result_a.success || !state.result_b.success {
            state.flag(IssueFlag::AiError);
        }

        self.cross_validation_pass(product, &submit_schema, &mut state)
            .await;
        self.retry_loop(product, &submit_schema, &mut state).await;
        self.research_pass(product, &mut state).await;

        self.finalize(product, state)
    }

    /// INITIAL: invoke both providers concurrently with no retry context
    async fn initial_pass(&self, product: &RawProduct, schema: &AttributeSchema) -> RunState {
        let (result_a, result_b) = tokio::join!(
            self.guarded(
                self.provider_a.id(),
                self.provider_a.submit(product, schema, None),
            ),
            self.guarded(
                self.provider_b.id(),
                self.provider_b.submit(product, schema, None),
            ),
        );

        let mut state = RunState {
            result_a,
            result_b,
            consensus: FieldConsensusSet {
                fields: BTreeMap::new(),
                needs_research: Default::default(),
            },
            cleaner_corrections: Vec::new(),
            flags: Vec::new(),
            pass: 1,
            retry_count: 0,
        };
        self.ingest_results(product, &mut state);
        state
    }

    /// CROSS_VALIDATING: runs at most once, only on category disagreement
    async fn cross_validation_pass(
        &self,
        product: &RawProduct,
        schema: &AttributeSchema,
        state: &mut RunState,
    ) {
        let Some((category_a, category_b)) = self.category_mismatch(state) else {
            return;
        };
        state.flag(IssueFlag::CategoryMismatch);
        info!(
            product = %product.id,
            category_a = %category_a,
            category_b = %category_b,
            "category mismatch, cross-validating"
        );

        let peer_for_a = PeerAssessment {
            provider_id: state.result_b.provider_id.clone(),
            category: category_b,
            category_confidence: state.result_b.category_confidence,
        };
        let peer_for_b = PeerAssessment {
            provider_id: state.result_a.provider_id.clone(),
            category: category_a,
            category_confidence: state.result_a.category_confidence,
        };

        let (revised_a, revised_b) = tokio::join!(
            self.guarded(
                self.provider_a.id(),
                self.provider_a.cross_validate(product, schema, &peer_for_a),
            ),
            self.guarded(
                self.provider_b.id(),
                self.provider_b.cross_validate(product, schema, &peer_for_b),
            ),
        );

        // A failed revision keeps the original assessment
        if revised_a.success {
            state.result_a = revised_a;
        }
        if revised_b.success {
            state.result_b = revised_b;
        }
        state.pass += 1;
        self.ingest_results(product, state);
    }

    /// Field-level retry loop, bounded by `max_retries`
    async fn retry_loop(
        &self,
        product: &RawProduct,
        schema: &AttributeSchema,
        state: &mut RunState,
    ) {
        while state.retry_count < self.config.max_retries && !self.is_agreed(state) {
            sleep(self.config.retry_delay()).await;
            state.retry_count += 1;

            let context = RetryContext::new(
                state.retry_count + 1,
                state.consensus.discrepancies(),
                state.result_a.clone(),
                state.result_b.clone(),
            );
            debug!(
                product = %product.id,
                attempt = context.attempt_number,
                disputed = context.disputed_fields().len(),
                "retrying with context"
            );

            let (next_a, next_b) = tokio::join!(
                self.guarded(
                    self.provider_a.id(),
                    self.provider_a.submit(product, schema, Some(&context)),
                ),
                self.guarded(
                    self.provider_b.id(),
                    self.provider_b.submit(product, schema, Some(&context)),
                ),
            );
            state.pass += 1;

            if !next_a.success && !next_b.success {
                // The attempt produced nothing; keep the prior results and
                // stop burning budget
                self.audit
                    .record_attempt(&product.id, state.pass, &[&next_a, &next_b]);
                state.flag(IssueFlag::AiError);
                warn!(product = %product.id, "both providers failed on retry");
                break;
            }
            if !next_a.success || !next_b.success {
                state.flag(IssueFlag::AiError);
            }

            state.result_a = next_a;
            state.result_b = next_b;
            self.ingest_results(product, state);
        }
    }

    /// RESEARCHING: fill fields neither provider could populate, once a
    /// category has been agreed
    async fn research_pass(&self, product: &RawProduct, state: &mut RunState) {
        if state.consensus.needs_research.is_empty() {
            return;
        }
        let Some(category) = self.agreed_category(state) else {
            debug!(product = %product.id, "skipping research: no agreed category");
            return;
        };

        let request = self.research_request(product, &category, state);
        info!(
            product = %product.id,
            category = %category,
            fields = request.missing_fields.len(),
            "researching missing fields"
        );

        let (research_a, research_b) = tokio::join!(
            self.guarded(self.provider_a.id(), self.provider_a.research(&request)),
            self.guarded(self.provider_b.id(), self.provider_b.research(&request)),
        );
        state.pass += 1;
        self.audit
            .record_attempt(&product.id, state.pass, &[&research_a, &research_b]);

        self.merge_research(state, &research_a, &research_b);

        if !state.consensus.needs_research.is_empty() {
            state.flag(IssueFlag::ResearchFailed);
        }
    }

    /// Run a provider future under the configured deadline
    async fn guarded(
        &self,
        provider_id: &str,
        call: impl Future<Output = ProviderResult>,
    ) -> ProviderResult {
        match timeout(self.config.provider_timeout(), call).await {
            Ok(result) => result,
            Err(_) => ProviderResult::failure(
                provider_id,
                ProviderFailureKind::Timeout,
                format!("no response within {}s", self.config.provider_timeout_secs),
            ),
        }
    }

    /// Clean the current pair of results, rebuild consensus, record audit
    fn ingest_results(&self, product: &RawProduct, state: &mut RunState) {
        state.result_a = self.clean_result(state.result_a.clone(), &mut state.cleaner_corrections);
        state.result_b = self.clean_result(state.result_b.clone(), &mut state.cleaner_corrections);

        self.audit
            .record_attempt(&product.id, state.pass, &[&state.result_a, &state.result_b]);

        let mut consensus =
            build_field_consensus(&state.result_a, &state.result_b, &self.config.consensus);
        self.insert_category_consensus(&mut consensus, state);
        state.consensus = consensus;
    }

    /// Normalize string values, accumulating text-cleaner corrections
    fn clean_result(
        &self,
        result: ProviderResult,
        corrections: &mut Vec<Correction>,
    ) -> ProviderResult {
        if !result.success {
            return result;
        }
        let (fields, new_corrections) = clean_fields(&result.fields, self.picklist.as_ref());
        for correction in new_corrections {
            let duplicate = corrections.iter().any(|c| {
                c.field == correction.field && c.corrected_value == correction.corrected_value
            });
            if !duplicate {
                corrections.push(correction);
            }
        }
        ProviderResult { fields, ..result }
    }

    /// Category agreement participates in consensus as one more field
    fn insert_category_consensus(&self, consensus: &mut FieldConsensusSet, state: &RunState) {
        let category_a = state
            .result_a
            .success
            .then_some(state.result_a.determined_category.as_deref())
            .flatten();
        let category_b = state
            .result_b
            .success
            .then_some(state.result_b.determined_category.as_deref())
            .flatten();

        let entry = match (category_a, category_b) {
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => FieldConsensus {
                field: CATEGORY_FIELD.to_string(),
                provider_a_value: Some(FieldValue::String(a.to_string())),
                provider_b_value: Some(FieldValue::String(b.to_string())),
                agreed: true,
                final_value: Some(FieldValue::String(a.to_string())),
                source: ConsensusSource::Consensus,
            },
            (Some(a), Some(b)) => {
                let conf_a = state.result_a.category_confidence;
                let conf_b = state.result_b.category_confidence;
                let margin = self.config.consensus.arbitration_margin;
                let accept = self.config.consensus.accept_threshold;
                let (final_value, source) = if conf_a - conf_b > margin && conf_a >= accept {
                    (
                        Some(FieldValue::String(a.to_string())),
                        ConsensusSource::ProviderAOnly,
                    )
                } else if conf_b - conf_a > margin && conf_b >= accept {
                    (
                        Some(FieldValue::String(b.to_string())),
                        ConsensusSource::ProviderBOnly,
                    )
                } else {
                    (None, ConsensusSource::Unresolved)
                };
                FieldConsensus {
                    field: CATEGORY_FIELD.to_string(),
                    provider_a_value: Some(FieldValue::String(a.to_string())),
                    provider_b_value: Some(FieldValue::String(b.to_string())),
                    agreed: false,
                    final_value,
                    source,
                }
            }
            (Some(a), None) | (None, Some(a)) => {
                let (result, source) = if category_a.is_some() {
                    (&state.result_a, ConsensusSource::ProviderAOnly)
                } else {
                    (&state.result_b, ConsensusSource::ProviderBOnly)
                };
                let accepted = result.category_confidence >= self.config.consensus.accept_threshold;
                FieldConsensus {
                    field: CATEGORY_FIELD.to_string(),
                    provider_a_value: category_a.map(|c| FieldValue::String(c.to_string())),
                    provider_b_value: category_b.map(|c| FieldValue::String(c.to_string())),
                    agreed: false,
                    final_value: accepted.then(|| FieldValue::String(a.to_string())),
                    source: if accepted {
                        source
                    } else {
                        ConsensusSource::Unresolved
                    },
                }
            }
            (None, None) => return,
        };

        consensus.fields.insert(CATEGORY_FIELD.to_string(), entry);
    }

    /// Both providers succeeded with differing categories
    fn category_mismatch(&self, state: &RunState) -> Option<(String, String)> {
        if !state.result_a.success || !state.result_b.success {
            return None;
        }
        let a = state.result_a.determined_category.as_deref()?;
        let b = state.result_b.determined_category.as_deref()?;
        (!a.eq_ignore_ascii_case(b)).then(|| (a.to_string(), b.to_string()))
    }

    /// The category the run has settled on, if any
    fn agreed_category(&self, state: &RunState) -> Option<String> {
        state
            .consensus
            .fields
            .get(CATEGORY_FIELD)
            .and_then(|c| c.final_value.as_ref())
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Strict agreement: score over threshold and nothing unresolved
    fn is_agreed(&self, state: &RunState) -> bool {
        let comparison = compare_result_sets(&state.result_a, &state.result_b);
        comparison.overall_score >= self.config.agreement_threshold
            && !state.consensus.has_unresolved()
    }

    fn research_request(
        &self,
        product: &RawProduct,
        category: &str,
        state: &RunState,
    ) -> ResearchRequest {
        let merged = state.consensus.merged_fields();
        let text_of = |key: &str| -> Option<String> {
            merged
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .or_else(|| product.text_field(key).map(str::to_string))
        };

        ResearchRequest {
            product_id: product.id.clone(),
            brand: text_of("brand"),
            model: text_of("model").or_else(|| text_of("model_number")),
            category: category.to_string(),
            missing_fields: state.consensus.needs_research.clone(),
        }
    }

    /// Merge research findings under the same match/accept rules as the
    /// main consensus pass
    fn merge_research(
        &self,
        state: &mut RunState,
        research_a: &ProviderResult,
        research_b: &ProviderResult,
    ) {
        let restrict = |result: &ProviderResult| -> ProviderResult {
            let fields: BTreeMap<String, FieldValue> = result
                .fields
                .iter()
                .filter(|(name, _)| state.consensus.needs_research.contains(*name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            ProviderResult {
                fields,
                missing_fields: Default::default(),
                ..result.clone()
            }
        };

        let findings = build_field_consensus(
            &restrict(research_a),
            &restrict(research_b),
            &self.config.consensus,
        );

        for (name, consensus) in findings.fields {
            if consensus.final_value.is_some() {
                debug!(field = %name, source = ?consensus.source, "research resolved field");
                state.consensus.needs_research.remove(&name);
                state.consensus.fields.insert(name, consensus);
            }
        }
    }

    /// Terminal FAILED: both providers down on the initial pass
    fn finalize_failed(&self, product: &RawProduct, state: RunState) -> ConsensusResult {
        warn!(product = %product.id, "both providers failed, no merge possible");

        let result = ConsensusResult {
            run_id: RunId::new(),
            product_id: product.id.clone(),
            category: None,
            agreed: false,
            agreement_score: 0.0,
            verification_score: 0.0,
            merged_fields: BTreeMap::new(),
            corrections: Vec::new(),
            discrepancies: Vec::new(),
            needs_research: Default::default(),
            retry_count: 0,
            outcome: RunOutcome::Failed,
            finalized_at: unix_now(),
        };
        self.audit.record_result(&result);
        self.audit.record_flags(&product.id, &state.flags);
        result
    }

    /// Terminal AGREED/ESCALATED: merge what was accepted and score it
    fn finalize(
        &self,
        product: &RawProduct,
        mut state: RunState,
    ) -> Result<ConsensusResult, EngineError> {
        let comparison = compare_result_sets(&state.result_a, &state.result_b);
        let agreed = comparison.overall_score >= self.config.agreement_threshold
            && !state.consensus.has_unresolved();

        let category = self.agreed_category(&state);
        let scoring_schema =
            self.resolve_schema(category.as_deref().or(product.category_hint.as_deref()))?;
        let score = verification_score(&state.consensus, &scoring_schema);

        if !agreed {
            state.flag(IssueFlag::ConsensusFailure);
        } else if score < self.config.low_confidence_floor {
            state.flag(IssueFlag::LowConfidence);
        }

        let mut corrections =
            dedupe_corrections(&state.result_a.corrections, &state.result_b.corrections);
        corrections.extend(state.cleaner_corrections.clone());

        let result = ConsensusResult {
            run_id: RunId::new(),
            product_id: product.id.clone(),
            category,
            agreed,
            agreement_score: comparison.overall_score,
            verification_score: score,
            merged_fields: state.consensus.merged_fields(),
            corrections,
            discrepancies: state.consensus.discrepancies(),
            needs_research: state.consensus.needs_research.clone(),
            retry_count: state.retry_count,
            outcome: if agreed {
                RunOutcome::Agreed
            } else {
                RunOutcome::Escalated
            },
            finalized_at: unix_now(),
        };

        info!(
            product = %product.id,
            agreed,
            agreement_score = result.agreement_score,
            verification_score = result.verification_score,
            retries = result.retry_count,
            "run finalized"
        );
        self.audit.record_result(&result);
        self.audit.record_flags(&product.id, &state.flags);
        Ok(result)
    }

    fn resolve_schema(&self, category: Option<&str>) -> Result<AttributeSchema, EngineError> {
        let resolved = match category {
            Some(category) => self.schema_provider.schema_for(category),
            None => self.schema_provider.primary_fields(),
        };
        resolved.map_err(|e| EngineError::Schema(e.to_string()))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
