//! Persistence seams used by the delivery pipeline.
//!
//! Postgres implementations live in [`crate::postgres`], in-memory ones in
//! [`crate::memory`].

use async_trait::async_trait;

use herald_common::types::{AuditRecord, Recipient};

use crate::error::StoreError;

/// Recipient identities and their current push endpoints.
///
/// Shared by every concurrent delivery request. The only write is
/// [`EndpointStore::clear_endpoints`], which is idempotent and commutative.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Whether any recipient belongs to `segment`.
    async fn segment_exists(&self, segment: &str) -> Result<bool, StoreError>;

    /// Every recipient that currently has an endpoint.
    async fn with_endpoint(&self) -> Result<Vec<Recipient>, StoreError>;

    /// Recipients in `segment`, with or without an endpoint.
    async fn by_segment(&self, segment: &str) -> Result<Vec<Recipient>, StoreError>;

    /// Recipients among `identities`; unknown identities are omitted.
    async fn by_identities(&self, identities: &[String]) -> Result<Vec<Recipient>, StoreError>;

    /// Null out every endpoint currently equal to one of `endpoints`.
    ///
    /// Returns how many recipients were changed. Endpoints that are already
    /// cleared or were replaced in the meantime are left alone.
    async fn clear_endpoints(&self, endpoints: &[String]) -> Result<u64, StoreError>;
}

/// Append-only store of delivery audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, record: &AuditRecord) -> Result<(), StoreError>;

    /// Most recent records first.
    async fn recent(&self, limit: i64, offset: i64) -> Result<Vec<AuditRecord>, StoreError>;
}
