//! Retry context carried into re-invocations

use crate::consensus::Discrepancy;
use crate::provider_result::ProviderResult;
use serde::{Deserialize, Serialize};

/// Disagreement state passed to the providers on a retry attempt.
///
/// Created only when an attempt ends below the agreement threshold, handed
/// to the next invocation of both providers, then discarded. The attempt
/// number starts at 2: attempt 1 is always context-free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryContext {
    /// 1-based attempt number of the invocation this context feeds (>= 2)
    pub attempt_number: u32,

    /// Discrepancies left over from the previous attempt
    pub previous_discrepancies: Vec<Discrepancy>,

    /// The two results the previous attempt produced (A, B)
    pub previous_results: (ProviderResult, ProviderResult),
}

impl RetryContext {
    /// Build the context for the next attempt from the prior attempt's state
    pub fn new(
        attempt_number: u32,
        previous_discrepancies: Vec<Discrepancy>,
        result_a: ProviderResult,
        result_b: ProviderResult,
    ) -> Self {
        debug_assert!(attempt_number >= 2, "attempt 1 never carries a context");
        Self {
            attempt_number,
            previous_discrepancies,
            previous_results: (result_a, result_b),
        }
    }

    /// Names of the fields still in dispute
    pub fn disputed_fields(&self) -> Vec<&str> {
        self.previous_discrepancies
            .iter()
            .filter(|d| !d.resolved)
            .map(|d| d.field.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider_result::ProviderFailureKind;

    #[test]
    fn test_disputed_fields_skips_resolved() {
        let context = RetryContext::new(
            2,
            vec![
                Discrepancy {
                    field: "finish".to_string(),
                    provider_a_value: None,
                    provider_b_value: None,
                    resolved: false,
                    resolution: None,
                    resolution_source: None,
                },
                Discrepancy {
                    field: "width".to_string(),
                    provider_a_value: None,
                    provider_b_value: None,
                    resolved: true,
                    resolution: None,
                    resolution_source: None,
                },
            ],
            ProviderResult::failure("a", ProviderFailureKind::Timeout, "t"),
            ProviderResult::failure("b", ProviderFailureKind::Timeout, "t"),
        );

        assert_eq!(context.disputed_fields(), vec!["finish"]);
    }
}
