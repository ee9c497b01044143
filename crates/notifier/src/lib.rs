//! Push provider delivery.
//!
//! The rest of the workspace talks to the messaging provider only through the
//! [`PushProvider`] capability:
//! - [`HttpPushProvider`] performs real multicast calls over HTTP
//! - [`ScriptedProvider`] answers from a script, for tests and local runs
//!
//! Provider error codes are mapped onto [`FailureReason`] in [`classify`] and
//! nowhere else.
//!
//! [`FailureReason`]: herald_common::types::FailureReason

pub mod classify;
pub mod fake;
pub mod http;
pub mod provider;
pub mod retry;

pub use fake::ScriptedProvider;
pub use http::HttpPushProvider;
pub use provider::{EndpointResponse, ProviderError, PushMessage, PushProvider};
pub use retry::RetryPolicy;
