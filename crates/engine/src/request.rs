//! Delivery request validation.
//!
//! Title and body must contain something other than whitespace. Over-long
//! values are truncated silently to the provider limits, counted in
//! characters rather than bytes.

use serde::Serialize;

use herald_common::types::{MAX_BODY_CHARS, MAX_TITLE_CHARS, TargetSelector};
use herald_notifier::PushMessage;

use crate::error::DeliveryError;

/// An accepted, immutable delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeliveryRequest {
    title: String,
    body: String,
    target: TargetSelector,
}

impl DeliveryRequest {
    pub fn new(title: &str, body: &str, target: TargetSelector) -> Result<Self, DeliveryError> {
        if title.trim().is_empty() {
            return Err(DeliveryError::InvalidRequest(
                "title must not be empty".to_string(),
            ));
        }
        if body.trim().is_empty() {
            return Err(DeliveryError::InvalidRequest(
                "body must not be empty".to_string(),
            ));
        }

        Ok(Self {
            title: truncate_chars(title, MAX_TITLE_CHARS),
            body: truncate_chars(body, MAX_BODY_CHARS),
            target: normalize_target(target)?,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn target(&self) -> &TargetSelector {
        &self.target
    }

    /// Provider payload for this request.
    pub fn message(&self) -> PushMessage {
        PushMessage {
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}

/// Trim selector arguments; explicit ids are de-duplicated and sorted.
fn normalize_target(target: TargetSelector) -> Result<TargetSelector, DeliveryError> {
    match target {
        TargetSelector::All => Ok(TargetSelector::All),
        TargetSelector::Segment { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(DeliveryError::InvalidRequest(
                    "segment name must not be empty".to_string(),
                ));
            }
            Ok(TargetSelector::Segment {
                name: name.to_string(),
            })
        }
        TargetSelector::Explicit { ids } => {
            let mut ids: Vec<String> = ids
                .iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            ids.sort();
            ids.dedup();
            if ids.is_empty() {
                return Err(DeliveryError::InvalidRequest(
                    "explicit target needs at least one recipient id".to_string(),
                ));
            }
            Ok(TargetSelector::Explicit { ids })
        }
    }
}
