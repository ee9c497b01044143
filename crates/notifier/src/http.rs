//! HTTP multicast client for the push provider.
//!
//! Speaks the legacy multicast shape: one POST carrying `registration_ids`
//! and a `notification` block, answered by a `results` array with either a
//! `message_id` or an `error` code per endpoint, in request order.

use std::time::Duration;

use async_trait::async_trait;
use herald_common::config::AppConfig;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::{Deserialize, Serialize};

use crate::provider::{EndpointResponse, ProviderError, PushMessage, PushProvider};
use crate::retry::{RetryPolicy, with_retry};

#[derive(Serialize)]
struct MulticastRequest<'a> {
    registration_ids: &'a [String],
    notification: &'a PushMessage,
    priority: &'static str,
}

#[derive(Deserialize)]
struct MulticastResponse {
    #[serde(default)]
    results: Vec<MulticastResult>,
}

#[derive(Deserialize)]
struct MulticastResult {
    message_id: Option<String>,
    error: Option<String>,
}

impl From<MulticastResult> for EndpointResponse {
    fn from(result: MulticastResult) -> Self {
        match (result.error, result.message_id) {
            (Some(code), _) => EndpointResponse::Rejected { code },
            (None, Some(_)) => EndpointResponse::Accepted,
            (None, None) => EndpointResponse::Rejected {
                code: "MissingResult".to_string(),
            },
        }
    }
}

/// Provider client backed by `reqwest`.
pub struct HttpPushProvider {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl HttpPushProvider {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            api_key,
            retry,
        })
    }

    /// Build the client from `PUSH_*` settings.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        Self::new(
            config.push_provider_url.clone(),
            config.push_provider_api_key.clone(),
            Duration::from_secs(config.push_request_timeout_secs),
            RetryPolicy::new(
                config.push_max_attempts,
                Duration::from_millis(config.push_backoff_base_ms),
            ),
        )
    }

    async fn send_once(
        &self,
        message: &PushMessage,
        endpoints: &[String],
    ) -> Result<Vec<EndpointResponse>, ProviderError> {
        let mut request = self.client.post(&self.url).json(&MulticastRequest {
            registration_ids: endpoints,
            notification: message,
            priority: "high",
        });
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("key={}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                retry_after,
            });
        }

        let body: MulticastResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(body.results.into_iter().map(EndpointResponse::from).collect())
    }
}

#[async_trait]
impl PushProvider for HttpPushProvider {
    async fn send_multicast(
        &self,
        message: &PushMessage,
        endpoints: &[String],
    ) -> Result<Vec<EndpointResponse>, ProviderError> {
        with_retry(&self.retry, || self.send_once(message, endpoints)).await
    }
}
