//! Audit recorder — one immutable record per accepted delivery request.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use herald_common::types::AuditRecord;

use crate::aggregator::AggregateResult;
use crate::error::StoreError;
use crate::request::DeliveryRequest;
use crate::store::AuditStore;

pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Summarise a finished (or deadline-cut) request.
    pub fn build_record(
        id: Uuid,
        request: &DeliveryRequest,
        recipient_identities: Vec<String>,
        result: &AggregateResult,
        partial: bool,
    ) -> AuditRecord {
        AuditRecord {
            id,
            title: request.title().to_string(),
            body: request.body().to_string(),
            target_summary: request.target().to_string(),
            targeted_count: recipient_identities.len() as i64,
            recipient_identities,
            delivered_count: result.delivered as i64,
            failed_count: result.failed as i64,
            retire_requested_count: result.endpoints_to_retire.len() as i64,
            partial,
            created_at: Utc::now(),
        }
    }

    pub async fn record(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.store.insert(record).await?;

        tracing::info!(
            delivery_id = %record.id,
            targeted = record.targeted_count,
            delivered = record.delivered_count,
            failed = record.failed_count,
            partial = record.partial,
            "Audit record written"
        );

        Ok(())
    }

    /// Recent records, newest first. `limit` is clamped to 1..=100.
    pub async fn history(&self, limit: i64, offset: i64) -> Result<Vec<AuditRecord>, StoreError> {
        self.store.recent(limit.clamp(1, 100), offset.max(0)).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use herald_common::types::TargetSelector;

    use super::*;

    #[test]
    fn test_record_summarises_request_and_result() {
        let request = DeliveryRequest::new(
            "Title",
            "Body",
            TargetSelector::Segment {
                name: "premium".to_string(),
            },
        )
        .unwrap();
        let result = AggregateResult {
            delivered: 2,
            failed: 1,
            endpoints_to_retire: BTreeSet::from(["dead".to_string()]),
        };

        let record = AuditRecorder::build_record(
            Uuid::new_v4(),
            &request,
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            &result,
            false,
        );

        assert_eq!(record.target_summary, "segment:premium");
        assert_eq!(record.targeted_count, 3);
        assert_eq!(record.delivered_count, 2);
        assert_eq!(record.failed_count, 1);
        assert_eq!(record.retire_requested_count, 1);
        assert!(!record.partial);
    }
}
