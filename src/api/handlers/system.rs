//! Liveness, topics, metrics, health and cache endpoints.

use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, info, warn};

use crate::api::{AdminUser, AppState};
use crate::cache::TOPICS_KEY;
use crate::error::ApiError;
use crate::models::{CacheStatusResponse, MessageResponse, StatusResponse, TopicsResponse};
use crate::monitoring::{HealthReport, MetricsSummary};

pub const PREDEFINED_TOPICS: &[&str] = &[
    "Преимущества медитации",
    "Здоровое питание для занятых людей",
    "Советы по управлению временем",
    "Как начать свой бизнес",
    "Путешествия по бюджету",
];

/// Handler for GET /
pub async fn root_handler() -> Json<StatusResponse> {
    Json(StatusResponse::new("active").with_message("Blog Generator API работает"))
}

/// Unmatched routes, answered with the JSON error envelope.
pub async fn fallback_handler() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// Handler for GET /topics
///
/// Cache-aside over the static topic list.
pub async fn topics_handler(State(state): State<AppState>) -> Json<TopicsResponse> {
    let mut cache = state.cache.write().await;

    if let Some(cached) = cache.get(TOPICS_KEY) {
        match serde_json::from_value::<TopicsResponse>(cached) {
            Ok(topics) => return Json(topics),
            Err(e) => warn!(error = %e, "discarding unreadable cached topics"),
        }
    }

    let topics = TopicsResponse {
        topics: PREDEFINED_TOPICS.iter().map(|t| t.to_string()).collect(),
    };
    match serde_json::to_value(&topics) {
        Ok(value) => cache.set(TOPICS_KEY, value, None),
        Err(e) => warn!(error = %e, "failed to cache topics"),
    }
    debug!("topics cache populated");
    Json(topics)
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.metrics.read().await.summary())
}

/// Handler for GET /health
///
/// Returns 503 while any probe is not healthy.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.health.lock().await.check_all().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Handler for GET /cache/status
pub async fn cache_status_handler(State(state): State<AppState>) -> Json<CacheStatusResponse> {
    let cache = state.cache.read().await;
    Json(CacheStatusResponse::new(
        cache.size(),
        &cache.stats(),
        cache.default_ttl().as_secs(),
    ))
}

/// Handler for POST /cache/clear (admin only)
pub async fn cache_clear_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Json<MessageResponse> {
    let mut cache = state.cache.write().await;
    let removed = cache.size();
    cache.clear();
    info!(admin = %admin.username, removed, "cache cleared");
    Json(MessageResponse::new("Cache cleared successfully"))
}
