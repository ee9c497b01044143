//! Delivery dispatcher — sends batches to the push provider.
//!
//! Every batch runs in its own task on a `JoinSet`; a semaphore caps how many
//! provider calls are in flight at once. Outcomes are collected in completion
//! order. A batch whose call fails as a whole is marked `Failed(Transient)`
//! for every recipient and is not sent again within the same request.
//!
//! When the dispatch deadline passes, the remaining tasks are aborted and
//! their recipients are recorded as transient failures. Batches that had
//! already answered keep their outcomes. Calls the provider
//! already received may still be delivered; that cannot be undone.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use herald_common::types::{DeliveryOutcome, FailureReason};
use herald_notifier::classify::outcomes_for_batch;
use herald_notifier::{PushMessage, PushProvider};

use crate::partition::Batch;

/// Outcome for one eligible recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientOutcome {
    pub identity: String,
    pub endpoint: String,
    pub outcome: DeliveryOutcome,
}

/// Everything the dispatch phase produced.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<RecipientOutcome>,
    /// Batches that never reported back before the deadline.
    pub unfinished_batches: usize,
    /// Batches whose task panicked. Their recipients are transient failures
    /// but they do not make the report partial.
    pub panicked_batches: usize,
}

impl DispatchReport {
    pub fn is_partial(&self) -> bool {
        self.unfinished_batches > 0
    }
}

pub struct DeliveryDispatcher {
    provider: Arc<dyn PushProvider>,
    max_concurrency: usize,
    timeout: Duration,
}

impl DeliveryDispatcher {
    pub fn new(provider: Arc<dyn PushProvider>, max_concurrency: usize, timeout: Duration) -> Self {
        Self {
            provider,
            max_concurrency: max_concurrency.max(1),
            timeout,
        }
    }

    /// Send every batch and return exactly one outcome per recipient.
    pub async fn dispatch(&self, message: &PushMessage, batches: Vec<Batch>) -> DispatchReport {
        let mut report = DispatchReport::default();
        if batches.is_empty() {
            return report;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let message = Arc::new(message.clone());
        let mut pending: HashMap<usize, Arc<Batch>> = HashMap::with_capacity(batches.len());
        let mut tasks = JoinSet::new();

        for batch in batches {
            let batch = Arc::new(batch);
            pending.insert(batch.index, batch.clone());

            let semaphore = semaphore.clone();
            let provider = self.provider.clone();
            let message = message.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcomes = send_batch(provider.as_ref(), &message, &batch).await;
                (batch.index, outcomes)
            });
        }

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    tracing::warn!(
                        timeout_secs = self.timeout.as_secs_f64(),
                        unfinished = tasks.len(),
                        "Dispatch deadline reached, abandoning unfinished batches"
                    );
                    tasks.abort_all();
                    // Batches that finished before the abort still hold their outcomes.
                    while let Some(joined) = tasks.join_next().await {
                        record_joined(joined, &mut pending, &mut report);
                    }
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(joined) => record_joined(joined, &mut pending, &mut report),
                    None => break,
                },
            }
        }

        // Anything still pending never reported back: it was abandoned at the
        // deadline or its task panicked.
        report.unfinished_batches = pending.len().saturating_sub(report.panicked_batches);
        for batch in pending.into_values() {
            report
                .outcomes
                .extend(uniform_outcomes(&batch, FailureReason::Transient));
        }

        report
    }
}

type Joined = Result<(usize, Vec<RecipientOutcome>), JoinError>;

fn record_joined(
    joined: Joined,
    pending: &mut HashMap<usize, Arc<Batch>>,
    report: &mut DispatchReport,
) {
    match joined {
        Ok((index, outcomes)) => {
            pending.remove(&index);
            report.outcomes.extend(outcomes);
        }
        Err(e) if e.is_panic() => {
            tracing::error!(error = %e, "Batch task panicked");
            report.panicked_batches += 1;
        }
        Err(_) => {}
    }
}

/// One provider call for one batch.
async fn send_batch(
    provider: &dyn PushProvider,
    message: &PushMessage,
    batch: &Batch,
) -> Vec<RecipientOutcome> {
    let endpoints = batch.endpoints();

    match provider.send_multicast(message, &endpoints).await {
        Ok(responses) => {
            let outcomes = outcomes_for_batch(&responses, batch.len());
            tracing::debug!(
                batch_index = batch.index,
                batch_size = batch.len(),
                "Batch sent"
            );
            batch
                .recipients
                .iter()
                .zip(outcomes)
                .map(|(recipient, outcome)| RecipientOutcome {
                    identity: recipient.identity.clone(),
                    endpoint: recipient.endpoint.clone(),
                    outcome,
                })
                .collect()
        }
        Err(e) => {
            tracing::warn!(
                batch_index = batch.index,
                batch_size = batch.len(),
                error = %e,
                "Batch call failed, marking every recipient as transient failure"
            );
            uniform_outcomes(batch, FailureReason::Transient)
        }
    }
}

fn uniform_outcomes(batch: &Batch, reason: FailureReason) -> Vec<RecipientOutcome> {
    batch
        .recipients
        .iter()
        .map(|recipient| RecipientOutcome {
            identity: recipient.identity.clone(),
            endpoint: recipient.endpoint.clone(),
            outcome: DeliveryOutcome::Failed(reason),
        })
        .collect()
}
