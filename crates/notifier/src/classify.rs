//! Provider feedback → delivery outcomes.
//!
//! This is the single place that inspects provider error codes. Everything
//! downstream works with [`DeliveryOutcome`] and [`FailureReason`] only.

use herald_common::types::{DeliveryOutcome, FailureReason};

use crate::provider::EndpointResponse;

/// Error codes meaning the endpoint itself is dead and should be retired.
///
/// Covers the legacy multicast API, the Admin SDK and the HTTP v1 API.
const PERMANENT_ENDPOINT_CODES: &[&str] = &[
    "NotRegistered",
    "InvalidRegistration",
    "MissingRegistration",
    "MismatchSenderId",
    "messaging/registration-token-not-registered",
    "messaging/invalid-registration-token",
    "UNREGISTERED",
];

/// Classify a provider error code. Unknown codes are transient.
pub fn classify_error_code(code: &str) -> FailureReason {
    if PERMANENT_ENDPOINT_CODES.contains(&code) {
        FailureReason::PermanentEndpoint
    } else {
        FailureReason::Transient
    }
}

/// Map one response onto an outcome.
pub fn outcome_for(response: &EndpointResponse) -> DeliveryOutcome {
    match response {
        EndpointResponse::Accepted => DeliveryOutcome::Delivered,
        EndpointResponse::Rejected { code } => DeliveryOutcome::Failed(classify_error_code(code)),
    }
}

/// Map a whole multicast response onto exactly `batch_len` outcomes.
///
/// Positions the provider did not answer are `Failed(Transient)`; surplus
/// answers are ignored.
pub fn outcomes_for_batch(responses: &[EndpointResponse], batch_len: usize) -> Vec<DeliveryOutcome> {
    if responses.len() != batch_len {
        tracing::warn!(
            expected = batch_len,
            received = responses.len(),
            "Provider response length does not match batch size"
        );
    }

    (0..batch_len)
        .map(|i| {
            responses
                .get(i)
                .map(outcome_for)
                .unwrap_or(DeliveryOutcome::Failed(FailureReason::Transient))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(code: &str) -> EndpointResponse {
        EndpointResponse::Rejected {
            code: code.to_string(),
        }
    }

    #[test]
    fn test_unregistered_tokens_are_permanent() {
        assert_eq!(
            classify_error_code("NotRegistered"),
            FailureReason::PermanentEndpoint
        );
        assert_eq!(
            classify_error_code("messaging/registration-token-not-registered"),
            FailureReason::PermanentEndpoint
        );
        assert_eq!(
            classify_error_code("messaging/invalid-registration-token"),
            FailureReason::PermanentEndpoint
        );
    }

    #[test]
    fn test_rate_limits_and_outages_are_transient() {
        for code in [
            "Unavailable",
            "InternalServerError",
            "DeviceMessageRateExceeded",
            "QUOTA_EXCEEDED",
            "messaging/server-unavailable",
            "",
        ] {
            assert_eq!(classify_error_code(code), FailureReason::Transient, "{code}");
        }
    }

    #[test]
    fn test_batch_outcomes_follow_response_order() {
        let responses = vec![
            EndpointResponse::Accepted,
            rejected("NotRegistered"),
            rejected("Unavailable"),
        ];
        let outcomes = outcomes_for_batch(&responses, 3);
        assert_eq!(
            outcomes,
            vec![
                DeliveryOutcome::Delivered,
                DeliveryOutcome::Failed(FailureReason::PermanentEndpoint),
                DeliveryOutcome::Failed(FailureReason::Transient),
            ]
        );
    }

    #[test]
    fn test_short_response_pads_with_transient_failures() {
        let outcomes = outcomes_for_batch(&[EndpointResponse::Accepted], 3);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], DeliveryOutcome::Delivered);
        assert_eq!(outcomes[1], DeliveryOutcome::Failed(FailureReason::Transient));
        assert_eq!(outcomes[2], DeliveryOutcome::Failed(FailureReason::Transient));
    }

    #[test]
    fn test_long_response_is_truncated() {
        let responses = vec![EndpointResponse::Accepted; 5];
        assert_eq!(outcomes_for_batch(&responses, 2).len(), 2);
    }
}
