use thiserror::Error;

use herald_common::error::AppError;

/// Failure talking to the endpoint or audit store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a delivery request before anything is sent.
///
/// Per-endpoint and per-batch failures are never surfaced here; they are
/// folded into the aggregate counts instead.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::InvalidRequest(msg) | DeliveryError::InvalidTarget(msg) => {
                AppError::Validation(msg)
            }
            DeliveryError::Store(StoreError::Database(e)) => AppError::Database(e),
            DeliveryError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        DeliveryError::Store(err).into()
    }
}
