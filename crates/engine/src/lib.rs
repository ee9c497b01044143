//! Bulk push-notification delivery.
//!
//! A delivery request flows through:
//! 1. `request` — validate and truncate title/body, check the selector
//! 2. `resolver` — selector → recipients with a usable endpoint
//! 3. `partition` — recipients → provider-sized batches
//! 4. `dispatcher` — batches → per-recipient outcomes, bounded concurrency
//! 5. `aggregator` — outcomes → totals + endpoints to retire
//! 6. `lifecycle` and `audit` — prune dead endpoints, persist the record
//!
//! `service::NotificationService` wires the stages together.

pub mod aggregator;
pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod memory;
pub mod partition;
pub mod postgres;
pub mod request;
pub mod resolver;
pub mod service;
pub mod store;
