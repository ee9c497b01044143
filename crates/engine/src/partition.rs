//! Batch partitioner.

use herald_common::types::PROVIDER_MAX_BATCH;

use crate::resolver::EligibleRecipient;

/// Recipients sent to the provider in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position in the partition, starting at 0.
    pub index: usize,
    pub recipients: Vec<EligibleRecipient>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.recipients.iter().map(|r| r.endpoint.clone()).collect()
    }
}

/// Split recipients into batches of `max_batch` (clamped to 1..=500); only
/// the last batch may be smaller.
///
/// Recipients are ordered by identity first, so the same set always yields the
/// same batches regardless of input order. An empty set yields no batches.
pub fn partition(mut recipients: Vec<EligibleRecipient>, max_batch: usize) -> Vec<Batch> {
    let size = max_batch.clamp(1, PROVIDER_MAX_BATCH);
    recipients.sort();

    let mut batches = Vec::with_capacity(recipients.len().div_ceil(size));
    let mut iter = recipients.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(Batch {
            index: batches.len(),
            recipients: iter.by_ref().take(size).collect(),
        });
    }
    batches
}
