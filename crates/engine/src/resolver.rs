//! Recipient resolver — turns a target selector into deliverable recipients.
//!
//! Read-only against the endpoint store. Recipients without an endpoint, or
//! with one shorter than the configured minimum, are dropped here and take
//! no part in any later stage.

use std::collections::HashSet;
use std::sync::Arc;

use herald_common::types::{Recipient, TargetSelector};

use crate::error::DeliveryError;
use crate::store::EndpointStore;

/// A recipient that will be sent to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EligibleRecipient {
    pub identity: String,
    pub endpoint: String,
}

pub struct RecipientResolver {
    store: Arc<dyn EndpointStore>,
    min_endpoint_len: usize,
}

impl RecipientResolver {
    pub fn new(store: Arc<dyn EndpointStore>, min_endpoint_len: usize) -> Self {
        Self {
            store,
            min_endpoint_len,
        }
    }

    /// Resolve `selector` to the recipients that can be delivered to.
    ///
    /// Fails with [`DeliveryError::InvalidTarget`] when a segment is unknown.
    pub async fn resolve(
        &self,
        selector: &TargetSelector,
    ) -> Result<Vec<EligibleRecipient>, DeliveryError> {
        let recipients = match selector {
            TargetSelector::All => self.store.with_endpoint().await?,
            TargetSelector::Segment { name } => {
                if !self.store.segment_exists(name).await? {
                    return Err(DeliveryError::InvalidTarget(format!(
                        "unknown segment '{}'",
                        name
                    )));
                }
                self.store.by_segment(name).await?
            }
            TargetSelector::Explicit { ids } => self.store.by_identities(ids).await?,
        };

        let found = recipients.len();
        let eligible = self.eligible(recipients);

        tracing::debug!(
            target_selector = %selector,
            found,
            eligible = eligible.len(),
            "Recipients resolved"
        );

        Ok(eligible)
    }

    /// Keep recipients with a usable endpoint, one entry per identity.
    fn eligible(&self, recipients: Vec<Recipient>) -> Vec<EligibleRecipient> {
        let mut seen = HashSet::new();
        recipients
            .into_iter()
            .filter_map(|recipient| {
                let endpoint = recipient.endpoint?;
                if endpoint.trim().len() < self.min_endpoint_len {
                    return None;
                }
                if !seen.insert(recipient.identity.clone()) {
                    return None;
                }
                Some(EligibleRecipient {
                    identity: recipient.identity,
                    endpoint,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEndpointStore;

    const TOKEN_A: &str = "token-aaaaaaaaaaaaaaaaaaaa";
    const TOKEN_B: &str = "token-bbbbbbbbbbbbbbbbbbbb";
    const TOKEN_C: &str = "token-cccccccccccccccccccc";

    fn resolver() -> RecipientResolver {
        let store = InMemoryEndpointStore::from_rows([
            ("alice", "premium", Some(TOKEN_A)),
            ("bob", "free", Some(TOKEN_B)),
            ("carol", "free", None),
            ("dave", "free", Some("short")),
            ("erin", "premium", Some(TOKEN_C)),
        ]);
        RecipientResolver::new(Arc::new(store), 20)
    }

    fn identities(recipients: &[EligibleRecipient]) -> Vec<&str> {
        recipients.iter().map(|r| r.identity.as_str()).collect()
    }

    #[tokio::test]
    async fn test_all_skips_missing_and_malformed_endpoints() {
        let resolved = resolver().resolve(&TargetSelector::All).await.unwrap();
        assert_eq!(identities(&resolved), vec!["alice", "bob", "erin"]);
    }

    #[tokio::test]
    async fn test_segment_filters_by_account_class() {
        let resolved = resolver()
            .resolve(&TargetSelector::Segment {
                name: "free".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(identities(&resolved), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_unknown_segment_is_invalid_target() {
        let err = resolver()
            .resolve(&TargetSelector::Segment {
                name: "gold".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_explicit_ids_looked_up_directly() {
        let resolved = resolver()
            .resolve(&TargetSelector::Explicit {
                ids: vec![
                    "erin".to_string(),
                    "carol".to_string(),
                    "nobody".to_string(),
                ],
            })
            .await
            .unwrap();
        assert_eq!(identities(&resolved), vec!["erin"]);
        assert_eq!(resolved[0].endpoint, TOKEN_C);
    }
}
