//! Endpoint lifecycle manager — retires endpoints the provider rejected for good.
//!
//! Pruning is a single bulk "clear if still equal to one of these" update, so
//! concurrent requests retiring overlapping sets never conflict. An endpoint
//! that escapes pruning fails again on its next use and is pruned then.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::EndpointStore;

pub struct EndpointLifecycleManager {
    store: Arc<dyn EndpointStore>,
}

impl EndpointLifecycleManager {
    pub fn new(store: Arc<dyn EndpointStore>) -> Self {
        Self { store }
    }

    /// Clear `endpoints` from the store. Returns the number of recipients changed.
    pub async fn retire(&self, endpoints: &BTreeSet<String>) -> Result<u64, StoreError> {
        if endpoints.is_empty() {
            return Ok(0);
        }

        let endpoints: Vec<String> = endpoints.iter().cloned().collect();
        let cleared = self.store.clear_endpoints(&endpoints).await?;

        tracing::info!(
            requested = endpoints.len(),
            cleared,
            "Retired dead push endpoints"
        );

        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEndpointStore;

    #[tokio::test]
    async fn test_retire_twice_equals_once() {
        let store = Arc::new(InMemoryEndpointStore::from_rows([
            ("alice", "free", Some("dead-endpoint")),
            ("bob", "free", Some("live-endpoint")),
        ]));
        let manager = EndpointLifecycleManager::new(store.clone());
        let endpoints = BTreeSet::from(["dead-endpoint".to_string()]);

        assert_eq!(manager.retire(&endpoints).await.unwrap(), 1);
        assert_eq!(manager.retire(&endpoints).await.unwrap(), 0);
        assert_eq!(store.endpoint_of("alice").await, None);
        assert_eq!(store.endpoint_of("bob").await, Some("live-endpoint".to_string()));
    }

    #[tokio::test]
    async fn test_nothing_to_retire_skips_store() {
        let store = Arc::new(InMemoryEndpointStore::new());
        let manager = EndpointLifecycleManager::new(store.clone());

        assert_eq!(manager.retire(&BTreeSet::new()).await.unwrap(), 0);
        assert_eq!(store.clear_calls(), 0);
    }
}
