//! Scripted stand-in for the push provider.
//!
//! Answers each multicast call from a caller-supplied function and records
//! what it was sent, how often, and how many calls overlapped.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::provider::{EndpointResponse, ProviderError, PushMessage, PushProvider};

type Responder =
    Box<dyn Fn(&[String]) -> Result<Vec<EndpointResponse>, ProviderError> + Send + Sync>;

pub struct ScriptedProvider {
    responder: Responder,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    sent: Mutex<Vec<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[String]) -> Result<Vec<EndpointResponse>, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Accepts every endpoint.
    pub fn accepting_all() -> Self {
        Self::new(|endpoints| Ok(vec![EndpointResponse::Accepted; endpoints.len()]))
    }

    /// Answers each endpoint independently.
    pub fn per_endpoint<F>(answer: F) -> Self
    where
        F: Fn(&str) -> EndpointResponse + Send + Sync + 'static,
    {
        Self::new(move |endpoints| Ok(endpoints.iter().map(|e| answer(e)).collect()))
    }

    /// Holds every call open for `delay`, so overlapping calls can be observed.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn max_observed_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Endpoint lists of every call made so far, in call order.
    pub fn sent_batches(&self) -> Vec<Vec<String>> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl PushProvider for ScriptedProvider {
    async fn send_multicast(
        &self,
        _message: &PushMessage,
        endpoints: &[String],
    ) -> Result<Vec<EndpointResponse>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(endpoints.to_vec());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = (self.responder)(endpoints);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls() {
        let provider = ScriptedProvider::per_endpoint(|e| {
            if e == "bad" {
                EndpointResponse::Rejected {
                    code: "NotRegistered".to_string(),
                }
            } else {
                EndpointResponse::Accepted
            }
        });
        let message = PushMessage {
            title: "t".to_string(),
            body: "b".to_string(),
        };

        let responses = provider
            .send_multicast(&message, &["good".to_string(), "bad".to_string()])
            .await
            .unwrap();

        assert_eq!(responses[0], EndpointResponse::Accepted);
        assert!(matches!(responses[1], EndpointResponse::Rejected { .. }));
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.max_observed_in_flight(), 1);
        assert_eq!(provider.sent_batches(), vec![vec!["good".to_string(), "bad".to_string()]]);
    }
}
