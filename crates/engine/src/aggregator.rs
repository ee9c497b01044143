//! Outcome aggregator — folds per-recipient outcomes into request totals.

use std::collections::BTreeSet;

use serde::Serialize;

use herald_common::types::DeliveryOutcome;

use crate::dispatcher::RecipientOutcome;

/// Totals for one delivery request.
///
/// `delivered + failed` always equals the number of outcomes recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub delivered: usize,
    pub failed: usize,
    /// Endpoints the provider reported as permanently invalid.
    pub endpoints_to_retire: BTreeSet<String>,
}

impl AggregateResult {
    /// Aggregate outcomes in any order.
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a RecipientOutcome>,
    {
        let mut result = Self::default();
        for outcome in outcomes {
            result.record(outcome);
        }
        result
    }

    pub fn record(&mut self, outcome: &RecipientOutcome) {
        match outcome.outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Failed(reason) => {
                self.failed += 1;
                if reason.is_permanent() {
                    self.endpoints_to_retire.insert(outcome.endpoint.clone());
                }
            }
        }
    }

    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}
