//! Duplicate-send guard — Redis-backed suppression of repeated submissions.
//!
//! A double-clicked "send" in the dashboard would otherwise push the same
//! notification to every recipient twice. The first submission of a given
//! (admin, request) pair claims a key for the configured window; identical
//! submissions inside the window are rejected.
//!
//! Uses Redis `SET NX EX` for atomic check-and-set with automatic TTL expiry.
//! Keys are SHA-256 digests of the request content, so every replica derives
//! the same key for the same request.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use sha2::{Digest, Sha256};

use herald_common::types::TargetSelector;

use crate::request::DeliveryRequest;

pub struct DuplicateSendGuard {
    window_secs: u64,
}

impl DuplicateSendGuard {
    pub fn new(window_secs: u64) -> Self {
        Self { window_secs }
    }

    pub fn is_enabled(&self) -> bool {
        self.window_secs > 0
    }

    /// Redis key for `admin` submitting `request`.
    pub fn key(admin: &str, request: &DeliveryRequest) -> String {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, request.title());
        update_field(&mut hasher, request.body());
        match request.target() {
            TargetSelector::All => update_field(&mut hasher, "all"),
            TargetSelector::Segment { name } => {
                update_field(&mut hasher, "segment");
                update_field(&mut hasher, name);
            }
            TargetSelector::Explicit { ids } => {
                update_field(&mut hasher, "explicit");
                for id in ids {
                    update_field(&mut hasher, id);
                }
            }
        }
        format!("notification:send:{}:{:x}", admin, hasher.finalize())
    }

    /// Claim `key` for the window.
    ///
    /// Returns `true` if the send may proceed, `false` if an identical send
    /// was claimed within the window. Always `true` when the window is 0.
    pub async fn try_claim(
        &self,
        redis: &mut ConnectionManager,
        key: &str,
    ) -> Result<bool, redis::RedisError> {
        if !self.is_enabled() {
            return Ok(true);
        }

        // SET key "1" NX EX window_secs
        // Returns Some("OK") if the key was set, None if it already existed
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(self.window_secs)
            .query_async(redis)
            .await?;

        let claimed = result.is_some();
        if !claimed {
            tracing::debug!(key, window_secs = self.window_secs, "Duplicate send suppressed");
        }

        Ok(claimed)
    }

    /// Give up a claim, e.g. when the request was rejected before sending.
    pub async fn release(
        &self,
        redis: &mut ConnectionManager,
        key: &str,
    ) -> Result<(), redis::RedisError> {
        if self.is_enabled() {
            redis.del::<_, ()>(key).await?;
        }
        Ok(())
    }
}

/// Length-prefixed, so field boundaries cannot shift between requests.
fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}
