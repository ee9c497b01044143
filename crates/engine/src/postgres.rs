//! Postgres-backed stores.

use async_trait::async_trait;
use sqlx::PgPool;

use herald_common::types::{AuditRecord, Recipient};

use crate::error::StoreError;
use crate::store::{AuditStore, EndpointStore};

/// Endpoint store over the `recipients` table.
#[derive(Clone)]
pub struct PgEndpointStore {
    pool: PgPool,
}

impl PgEndpointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EndpointStore for PgEndpointStore {
    async fn segment_exists(&self, segment: &str) -> Result<bool, StoreError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM recipients WHERE account_class = $1)")
                .bind(segment)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn with_endpoint(&self) -> Result<Vec<Recipient>, StoreError> {
        let recipients: Vec<Recipient> = sqlx::query_as(
            r#"
            SELECT identity, push_endpoint AS endpoint
            FROM recipients
            WHERE push_endpoint IS NOT NULL
            ORDER BY identity
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }

    async fn by_segment(&self, segment: &str) -> Result<Vec<Recipient>, StoreError> {
        let recipients: Vec<Recipient> = sqlx::query_as(
            r#"
            SELECT identity, push_endpoint AS endpoint
            FROM recipients
            WHERE account_class = $1
            ORDER BY identity
            "#,
        )
        .bind(segment)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }

    async fn by_identities(&self, identities: &[String]) -> Result<Vec<Recipient>, StoreError> {
        let recipients: Vec<Recipient> = sqlx::query_as(
            r#"
            SELECT identity, push_endpoint AS endpoint
            FROM recipients
            WHERE identity = ANY($1)
            ORDER BY identity
            "#,
        )
        .bind(identities)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }

    async fn clear_endpoints(&self, endpoints: &[String]) -> Result<u64, StoreError> {
        if endpoints.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE recipients
            SET push_endpoint = NULL, updated_at = NOW()
            WHERE push_endpoint = ANY($1)
            "#,
        )
        .bind(endpoints)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Audit store over the `notification_audit` table.
#[derive(Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert(&self, record: &AuditRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO notification_audit (
                id, title, body, target_summary, recipient_identities,
                targeted_count, delivered_count, failed_count, retire_requested_count, partial, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.body)
        .bind(&record.target_summary)
        .bind(sqlx::types::Json(&record.recipient_identities))
        .bind(record.targeted_count)
        .bind(record.delivered_count)
        .bind(record.failed_count)
        .bind(record.retire_requested_count)
        .bind(record.partial)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64, offset: i64) -> Result<Vec<AuditRecord>, StoreError> {
        let records: Vec<AuditRecord> = sqlx::query_as(
            "SELECT * FROM notification_audit ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
