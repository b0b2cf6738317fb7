//! Notification relay endpoints.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    Json,
};
use tracing::info;

use crate::api::{ApiJson, AppState};
use crate::error::Result;
use crate::models::{StatusResponse, TestNotificationQuery, WebhookRequest};
use crate::notify::messages;

fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

/// Handler for POST /api/webhook
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<WebhookRequest>,
) -> Result<Json<StatusResponse>> {
    req.validate()?;

    info!(event = %req.event, "webhook received");
    state
        .notifier
        .notify(messages::webhook(&req.event, &req.data, &base_url(&headers)));
    Ok(Json(StatusResponse::new("notification_sent")))
}

/// Handler for POST /test-telegram
pub async fn test_notification_handler(
    State(state): State<AppState>,
    Query(query): Query<TestNotificationQuery>,
) -> Json<StatusResponse> {
    state.notifier.notify(messages::test_message(&query.message));
    Json(StatusResponse::new("test_notification_sent"))
}
