use std::time::Duration;

use herald_common::config::AppConfig;
use herald_common::types::PROVIDER_MAX_BATCH;

const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Tuning for one delivery request.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Recipients per provider call (1..=500)
    pub max_batch: usize,
    /// Batch calls allowed in flight at once (≥ 1)
    pub max_concurrency: usize,
    /// Time budget for the dispatch phase; unanswered batches count as transient failures
    pub dispatch_timeout: Duration,
    /// Endpoints shorter than this are never sent to
    pub min_endpoint_len: usize,
    /// Duplicate-submission window in seconds (0 disables the guard)
    pub dedup_window_secs: u64,
}

impl DeliveryConfig {
    /// Clamp values into their valid ranges. A zero dispatch timeout would
    /// abandon every batch, so it falls back to the default.
    pub fn normalized(mut self) -> Self {
        self.max_batch = self.max_batch.clamp(1, PROVIDER_MAX_BATCH);
        self.max_concurrency = self.max_concurrency.max(1);
        if self.dispatch_timeout.is_zero() {
            self.dispatch_timeout = DEFAULT_DISPATCH_TIMEOUT;
        }
        self
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_batch: PROVIDER_MAX_BATCH,
            max_concurrency: 4,
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
            min_endpoint_len: 20,
            dedup_window_secs: 30,
        }
    }
}

impl From<&AppConfig> for DeliveryConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_batch: config.delivery_max_batch,
            max_concurrency: config.delivery_max_concurrency,
            dispatch_timeout: Duration::from_secs(config.delivery_timeout_secs),
            min_endpoint_len: config.min_endpoint_len,
            dedup_window_secs: config.send_dedup_window_secs,
        }
        .normalized()
    }
}
