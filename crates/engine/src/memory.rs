//! In-memory stores, for tests and running without a database.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use herald_common::types::{AuditRecord, Recipient};

use crate::error::StoreError;
use crate::store::{AuditStore, EndpointStore};

#[derive(Debug, Clone)]
struct Row {
    account_class: String,
    endpoint: Option<String>,
}

/// Endpoint store keyed by identity.
#[derive(Default)]
pub struct InMemoryEndpointStore {
    rows: RwLock<BTreeMap<String, Row>>,
    clear_calls: AtomicUsize,
    fail_clears: AtomicBool,
}

impl InMemoryEndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(identity, account_class, endpoint)` rows.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S, Option<S>)>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|(identity, account_class, endpoint)| {
                (
                    identity.into(),
                    Row {
                        account_class: account_class.into(),
                        endpoint: endpoint.map(Into::into),
                    },
                )
            })
            .collect();

        Self {
            rows: RwLock::new(rows),
            clear_calls: AtomicUsize::new(0),
            fail_clears: AtomicBool::new(false),
        }
    }

    /// Make every `clear_endpoints` call fail.
    pub fn with_failing_clears(self) -> Self {
        self.fail_clears.store(true, Ordering::SeqCst);
        self
    }

    pub async fn upsert(&self, identity: &str, account_class: &str, endpoint: Option<&str>) {
        self.rows.write().await.insert(
            identity.to_string(),
            Row {
                account_class: account_class.to_string(),
                endpoint: endpoint.map(str::to_string),
            },
        );
    }

    /// Current endpoint of `identity`, if the identity exists and has one.
    pub async fn endpoint_of(&self, identity: &str) -> Option<String> {
        self.rows
            .read()
            .await
            .get(identity)
            .and_then(|row| row.endpoint.clone())
    }

    /// Number of `clear_endpoints` calls so far.
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    fn to_recipient(identity: &str, row: &Row) -> Recipient {
        Recipient {
            identity: identity.to_string(),
            endpoint: row.endpoint.clone(),
        }
    }
}

#[async_trait]
impl EndpointStore for InMemoryEndpointStore {
    async fn segment_exists(&self, segment: &str) -> Result<bool, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .any(|row| row.account_class == segment))
    }

    async fn with_endpoint(&self) -> Result<Vec<Recipient>, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|(_, row)| row.endpoint.is_some())
            .map(|(identity, row)| Self::to_recipient(identity, row))
            .collect())
    }

    async fn by_segment(&self, segment: &str) -> Result<Vec<Recipient>, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|(_, row)| row.account_class == segment)
            .map(|(identity, row)| Self::to_recipient(identity, row))
            .collect())
    }

    async fn by_identities(&self, identities: &[String]) -> Result<Vec<Recipient>, StoreError> {
        let rows = self.rows.read().await;
        Ok(identities
            .iter()
            .filter_map(|id| rows.get(id).map(|row| Self::to_recipient(id, row)))
            .collect())
    }

    async fn clear_endpoints(&self, endpoints: &[String]) -> Result<u64, StoreError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_clears.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "endpoint store rejected the update".to_string(),
            ));
        }
        let targets: HashSet<&str> = endpoints.iter().map(String::as_str).collect();

        let mut cleared = 0;
        for row in self.rows.write().await.values_mut() {
            if row
                .endpoint
                .as_deref()
                .is_some_and(|endpoint| targets.contains(endpoint))
            {
                row.endpoint = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

/// Audit store held in a vector. Can be switched to fail every insert.
#[derive(Default)]
pub struct InMemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
    fail_inserts: AtomicBool,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose inserts always fail.
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_inserts.store(true, Ordering::SeqCst);
        store
    }

    /// All records, oldest first.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn insert(&self, record: &AuditRecord) -> Result<(), StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "audit store rejected the insert".to_string(),
            ));
        }
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: i64, offset: i64) -> Result<Vec<AuditRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
