//! Notification delivery routes.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use herald_common::error::AppError;
use herald_common::types::{AuditRecord, TargetSelector};
use herald_engine::guard::DuplicateSendGuard;
use herald_engine::request::DeliveryRequest;
use herald_engine::service::SendSummary;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/send", post(send_notification))
        .route("/api/notifications/history", get(list_history))
}

#[derive(Debug, Deserialize)]
pub struct SendNotificationParams {
    pub title: String,
    pub body: String,
    pub target: TargetSelector,
}

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: SendSummary,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub records: Vec<AuditRecord>,
}

/// POST /api/notifications/send — Deliver a notification to the selected recipients.
async fn send_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<SendNotificationParams>,
) -> Result<Json<SendNotificationResponse>, AppError> {
    let request = DeliveryRequest::new(&params.title, &params.body, params.target)?;

    let key = DuplicateSendGuard::key(&auth.admin, &request);
    let mut redis = state.redis.clone();
    if !state.guard.try_claim(&mut redis, &key).await? {
        return Err(AppError::Conflict(
            "An identical notification was sent moments ago".to_string(),
        ));
    }

    tracing::info!(
        admin = %auth.admin,
        target_selector = %request.target(),
        "Notification send accepted"
    );

    // Detached so a dropped client connection cannot cut delivery or the audit short.
    let service = state.notifications.clone();
    let outcome = tokio::spawn(async move { service.send(&request).await })
        .await
        .map_err(|e| AppError::Internal(format!("Delivery task failed: {}", e)))?;

    match outcome {
        Ok(summary) => Ok(Json(SendNotificationResponse {
            success: true,
            summary,
        })),
        Err(e) => {
            // Nothing was sent, so the same request may be retried right away.
            if let Err(release_err) = state.guard.release(&mut redis, &key).await {
                tracing::warn!(error = %release_err, "Failed to release duplicate-send claim");
            }
            Err(e.into())
        }
    }
}

/// GET /api/notifications/history — Recent delivery audit records, newest first.
async fn list_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, AppError> {
    let records = state
        .notifications
        .history(params.limit.unwrap_or(20), params.offset.unwrap_or(0))
        .await?;

    Ok(Json(HistoryResponse {
        success: true,
        records,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_params_parse_each_target_kind() {
        let all: SendNotificationParams = serde_json::from_value(serde_json::json!({
            "title": "Hi", "body": "There", "target": {"kind": "all"}
        }))
        .unwrap();
        assert_eq!(all.target, TargetSelector::All);

        let segment: SendNotificationParams = serde_json::from_value(serde_json::json!({
            "title": "Hi", "body": "There", "target": {"kind": "segment", "name": "premium"}
        }))
        .unwrap();
        assert_eq!(
            segment.target,
            TargetSelector::Segment {
                name: "premium".to_string()
            }
        );

        let explicit: SendNotificationParams = serde_json::from_value(serde_json::json!({
            "title": "Hi", "body": "There", "target": {"kind": "explicit", "ids": ["a", "b"]}
        }))
        .unwrap();
        assert_eq!(
            explicit.target,
            TargetSelector::Explicit {
                ids: vec!["a".to_string(), "b".to_string()]
            }
        );
    }

    #[test]
    fn test_unknown_target_kind_rejected() {
        let parsed: Result<SendNotificationParams, _> = serde_json::from_value(serde_json::json!({
            "title": "Hi", "body": "There", "target": {"kind": "everyone"}
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_response_flattens_summary() {
        let response = SendNotificationResponse {
            success: true,
            summary: SendSummary {
                delivered: 490,
                failed: 10,
                targeted: 500,
                retired: 10,
                audit_id: None,
                partial: false,
                warning: None,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["delivered"], 490);
        assert_eq!(json["failed"], 10);
        assert_eq!(json["targeted"], 500);
        assert!(json["audit_id"].is_null());
    }
}
