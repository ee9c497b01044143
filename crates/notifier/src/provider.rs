//! The push provider capability.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content sent to every endpoint of a batch.
///
/// Title and body are expected to be truncated to the provider limits already.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

/// The provider's answer for one endpoint of a multicast call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointResponse {
    Accepted,
    /// Rejected with a provider-specific error code (e.g. `NotRegistered`).
    Rejected { code: String },
}

/// A multicast call that did not produce per-endpoint answers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}")]
    Status {
        status: u16,
        retry_after: Option<Duration>,
    },

    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether repeating the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Decode(_) => false,
        }
    }

    /// Delay requested by the provider, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Sends one message to a batch of endpoints in a single call.
///
/// Implementations return one [`EndpointResponse`] per endpoint, in the order
/// the endpoints were given. An `Err` means the call as a whole failed.
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send_multicast(
        &self,
        message: &PushMessage,
        endpoints: &[String],
    ) -> Result<Vec<EndpointResponse>, ProviderError>;
}
