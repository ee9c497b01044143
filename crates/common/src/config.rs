use std::str::FromStr;

use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string
    pub redis_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// JWT secret for admin API authentication
    pub jwt_secret: String,

    /// Socket address the API server binds to
    pub api_bind_addr: String,

    /// Push provider multicast endpoint
    pub push_provider_url: String,

    /// Push provider server key
    pub push_provider_api_key: Option<String>,

    /// Per-call HTTP timeout for provider requests
    pub push_request_timeout_secs: u64,

    /// Transport-level attempts per batch call (1 = no retry)
    pub push_max_attempts: u32,

    /// First retry delay in milliseconds; doubles on every further attempt
    pub push_backoff_base_ms: u64,

    /// Recipients per provider call, clamped to the provider ceiling
    pub delivery_max_batch: usize,

    /// Maximum number of batch calls in flight for one delivery request
    pub delivery_max_concurrency: usize,

    /// Deadline for the dispatch phase of one delivery request
    pub delivery_timeout_secs: u64,

    /// Endpoints shorter than this are treated as malformed and skipped
    pub min_endpoint_len: usize,

    /// Window during which an identical send from the same admin is rejected
    pub send_dedup_window_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 20)?,
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            api_bind_addr: std::env::var("API_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            push_provider_url: std::env::var("PUSH_PROVIDER_URL")
                .unwrap_or_else(|_| "https://fcm.googleapis.com/fcm/send".to_string()),
            push_provider_api_key: std::env::var("PUSH_PROVIDER_API_KEY").ok(),
            push_request_timeout_secs: parse_or("PUSH_REQUEST_TIMEOUT_SECS", 30)?,
            push_max_attempts: parse_or("PUSH_MAX_ATTEMPTS", 1)?,
            push_backoff_base_ms: parse_or("PUSH_BACKOFF_BASE_MS", 500)?,
            delivery_max_batch: parse_or("DELIVERY_MAX_BATCH", 500)?,
            delivery_max_concurrency: parse_or("DELIVERY_MAX_CONCURRENCY", 4)?,
            delivery_timeout_secs: positive_or("DELIVERY_TIMEOUT_SECS", 120)?,
            min_endpoint_len: parse_or("MIN_ENDPOINT_LEN", 20)?,
            send_dedup_window_secs: parse_or("SEND_DEDUP_WINDOW_SECS", 30)?,
        })
    }
}

/// Read a numeric variable, falling back to `default` when it is unset.
fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid {}", key, std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_or`], but rejects 0.
fn positive_or(key: &str, default: u64) -> anyhow::Result<u64> {
    match parse_or(key, default)? {
        0 => Err(anyhow::anyhow!("{} must be greater than 0", key)),
        value => Ok(value),
    }
}
