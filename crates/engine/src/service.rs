//! Notification service — runs one delivery request end to end.
//!
//! resolve → partition → dispatch (bounded fan-out) → aggregate (fan-in) →
//! {retire endpoints, write audit record} (concurrently).
//!
//! Only an invalid request or target aborts; it does so before anything is
//! sent or written. Batch and endpoint failures end up in the counts, and a
//! failed audit write is reported as a warning alongside the counts.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use herald_common::types::AuditRecord;
use herald_notifier::PushProvider;

use crate::aggregator::AggregateResult;
use crate::audit::AuditRecorder;
use crate::config::DeliveryConfig;
use crate::dispatcher::{DeliveryDispatcher, DispatchReport};
use crate::error::{DeliveryError, StoreError};
use crate::lifecycle::EndpointLifecycleManager;
use crate::partition::partition;
use crate::request::DeliveryRequest;
use crate::resolver::RecipientResolver;
use crate::store::{AuditStore, EndpointStore};

/// What the caller gets back from a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendSummary {
    pub delivered: usize,
    pub failed: usize,
    /// Recipients with a usable endpoint; always `delivered + failed`.
    pub targeted: usize,
    /// Endpoints cleared from the store after permanent failures.
    pub retired: u64,
    /// Id of the audit record, if it was written.
    pub audit_id: Option<Uuid>,
    /// The dispatch deadline elapsed before every batch answered.
    pub partial: bool,
    pub warning: Option<String>,
}

pub struct NotificationService {
    resolver: RecipientResolver,
    dispatcher: DeliveryDispatcher,
    lifecycle: EndpointLifecycleManager,
    audit: AuditRecorder,
    config: DeliveryConfig,
}

impl NotificationService {
    pub fn new(
        endpoints: Arc<dyn EndpointStore>,
        audits: Arc<dyn AuditStore>,
        provider: Arc<dyn PushProvider>,
        config: DeliveryConfig,
    ) -> Self {
        let config = config.normalized();
        Self {
            resolver: RecipientResolver::new(endpoints.clone(), config.min_endpoint_len),
            dispatcher: DeliveryDispatcher::new(
                provider,
                config.max_concurrency,
                config.dispatch_timeout,
            ),
            lifecycle: EndpointLifecycleManager::new(endpoints),
            audit: AuditRecorder::new(audits),
            config,
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Deliver `request` to every recipient its selector resolves to.
    pub async fn send(&self, request: &DeliveryRequest) -> Result<SendSummary, DeliveryError> {
        let delivery_id = Uuid::new_v4();

        let recipients = self.resolver.resolve(request.target()).await?;
        let targeted = recipients.len();
        let identities: Vec<String> = recipients.iter().map(|r| r.identity.clone()).collect();

        let batches = partition(recipients, self.config.max_batch);
        tracing::info!(
            delivery_id = %delivery_id,
            target_selector = %request.target(),
            targeted,
            batches = batches.len(),
            "Dispatching notification"
        );

        let report = if batches.is_empty() {
            DispatchReport::default()
        } else {
            self.dispatcher.dispatch(&request.message(), batches).await
        };

        let result = AggregateResult::from_outcomes(&report.outcomes);
        debug_assert_eq!(result.total(), targeted);

        let record = AuditRecorder::build_record(
            delivery_id,
            request,
            identities,
            &result,
            report.is_partial(),
        );

        let (retired, audited) = tokio::join!(
            self.lifecycle.retire(&result.endpoints_to_retire),
            self.audit.record(&record),
        );

        let retired = retired.unwrap_or_else(|e| {
            tracing::warn!(
                delivery_id = %delivery_id,
                endpoints = result.endpoints_to_retire.len(),
                error = %e,
                "Failed to retire dead endpoints; they will be retried on next failure"
            );
            0
        });

        let (audit_id, warning) = Self::audit_outcome(&record, audited);

        tracing::info!(
            delivery_id = %delivery_id,
            delivered = result.delivered,
            failed = result.failed,
            retired,
            partial = report.is_partial(),
            panicked_batches = report.panicked_batches,
            "Notification delivery finished"
        );

        Ok(SendSummary {
            delivered: result.delivered,
            failed: result.failed,
            targeted,
            retired,
            audit_id,
            partial: report.is_partial(),
            warning,
        })
    }

    /// Recent audit records, newest first.
    pub async fn history(&self, limit: i64, offset: i64) -> Result<Vec<AuditRecord>, StoreError> {
        self.audit.history(limit, offset).await
    }

    fn audit_outcome(
        record: &AuditRecord,
        audited: Result<(), StoreError>,
    ) -> (Option<Uuid>, Option<String>) {
        match audited {
            Ok(()) => (Some(record.id), None),
            Err(e) => {
                tracing::warn!(
                    delivery_id = %record.id,
                    error = %e,
                    "Failed to persist audit record; delivery counts are unaffected"
                );
                (
                    None,
                    Some(format!("notification sent but audit record not saved: {}", e)),
                )
            }
        }
    }
}
