//! Herald API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_common::db::{connect_redis, create_pool, run_migrations};
use herald_notifier::HttpPushProvider;

use herald_api::routes::create_router;
use herald_api::state::AppState;

/// Upper bound on request bodies; explicit id lists dominate the size.
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "herald_api=debug,herald_engine=debug,herald_notifier=info,tower_http=debug",
            )
        }))
        .init();

    tracing::info!("Starting Herald API server...");

    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    let redis = connect_redis(&config.redis_url).await?;

    if config.push_provider_api_key.is_none() {
        tracing::warn!("PUSH_PROVIDER_API_KEY is not set; the provider will reject every call");
    }
    let provider = HttpPushProvider::from_config(&config)?;

    let addr: SocketAddr = config.api_bind_addr.parse()?;
    let state = AppState::new(pool, redis, config, Arc::new(provider));

    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
