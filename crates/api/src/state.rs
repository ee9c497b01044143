//! Shared application state for the Axum API server.

use std::sync::Arc;

use herald_common::config::AppConfig;
use herald_engine::config::DeliveryConfig;
use herald_engine::guard::DuplicateSendGuard;
use herald_engine::postgres::{PgAuditStore, PgEndpointStore};
use herald_engine::service::NotificationService;
use herald_notifier::PushProvider;
use redis::aio::ConnectionManager;
use sqlx::PgPool;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub redis: ConnectionManager,
    pub config: AppConfig,
    pub notifications: Arc<NotificationService>,
    pub guard: Arc<DuplicateSendGuard>,
}

impl AppState {
    /// Wire the Postgres-backed delivery pipeline around `provider`.
    pub fn new(
        pool: PgPool,
        redis: ConnectionManager,
        config: AppConfig,
        provider: Arc<dyn PushProvider>,
    ) -> Self {
        let notifications = NotificationService::new(
            Arc::new(PgEndpointStore::new(pool.clone())),
            Arc::new(PgAuditStore::new(pool.clone())),
            provider,
            DeliveryConfig::from(&config),
        );
        Self::with_service(pool, redis, config, notifications)
    }

    pub fn with_service(
        pool: PgPool,
        redis: ConnectionManager,
        config: AppConfig,
        notifications: NotificationService,
    ) -> Self {
        let guard = DuplicateSendGuard::new(notifications.config().dedup_window_secs);
        Self {
            pool,
            redis,
            config,
            notifications: Arc::new(notifications),
            guard: Arc::new(guard),
        }
    }
}
