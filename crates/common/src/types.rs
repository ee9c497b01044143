use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest number of endpoints the push provider accepts in one multicast call.
pub const PROVIDER_MAX_BATCH: usize = 500;

/// Notification title limit, in characters.
pub const MAX_TITLE_CHARS: usize = 65;

/// Notification body limit, in characters.
pub const MAX_BODY_CHARS: usize = 240;

/// Which recipients a delivery request is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetSelector {
    /// Every recipient that currently has an endpoint.
    All,
    /// Recipients whose account class equals `name`.
    Segment { name: String },
    /// A fixed list of recipient identities.
    Explicit { ids: Vec<String> },
}

impl std::fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetSelector::All => write!(f, "all"),
            TargetSelector::Segment { name } => write!(f, "segment:{}", name),
            TargetSelector::Explicit { ids } => write!(f, "explicit:{} ids", ids.len()),
        }
    }
}

/// A recipient identity paired with its current push endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipient {
    pub identity: String,
    pub endpoint: Option<String>,
}

/// Why a single endpoint did not receive a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The attempt failed; the endpoint itself may still be valid.
    Transient,
    /// The provider no longer recognises the endpoint.
    PermanentEndpoint,
}

impl FailureReason {
    /// Permanent failures retire the endpoint.
    pub fn is_permanent(self) -> bool {
        matches!(self, FailureReason::PermanentEndpoint)
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Transient => write!(f, "transient"),
            FailureReason::PermanentEndpoint => write!(f, "permanent_endpoint"),
        }
    }
}

/// Result of delivering to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed(FailureReason),
}

/// Immutable record of one accepted delivery request.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    /// Human-readable selector, e.g. `segment:premium`
    pub target_summary: String,
    #[sqlx(json)]
    pub recipient_identities: Vec<String>,
    pub targeted_count: i64,
    pub delivered_count: i64,
    pub failed_count: i64,
    /// Endpoints the provider rejected permanently and that were handed to
    /// pruning. The number actually cleared is only in the send response.
    pub retire_requested_count: i64,
    /// True when the dispatch deadline elapsed before every batch answered
    pub partial: bool,
    pub created_at: DateTime<Utc>,
}
