//! API Routes
//!
//! Configures the Axum router with every endpoint and the middleware stack.

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use super::handlers::{
    cache_clear_handler, cache_status_handler, change_password_handler, disable_user_handler,
    enable_user_handler, fallback_handler, generate_handler, health_handler, image_handler,
    list_users_handler, login_handler, me_handler, metrics_handler, register_handler,
    root_handler, test_notification_handler, topics_handler, webhook_handler,
};
use super::middleware::{
    panic_handler, rate_limit, request_span, screen_requests, track_requests, trusted_host,
};
use super::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; \
    font-src 'self'; \
    connect-src 'self'; \
    frame-ancestors 'none';";

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
];

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::CONTENT_LANGUAGE,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(600))
}

/// Creates the main router with all endpoints configured.
pub fn create_router(state: AppState) -> Router {
    let static_dir = &state.config.static_dir;

    let routes = Router::new()
        .route("/", get(root_handler))
        .route("/topics", get(topics_handler))
        .route("/generate", post(generate_handler))
        .route("/image/:topic", get(image_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/change-password", post(change_password_handler))
        .route("/auth/me", get(me_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/cache/status", get(cache_status_handler))
        .route("/cache/clear", post(cache_clear_handler))
        .route("/admin/users", get(list_users_handler))
        .route("/admin/users/:username/disable", post(disable_user_handler))
        .route("/admin/users/:username/enable", post(enable_user_handler))
        .route("/api/webhook", post(webhook_handler))
        .route("/test-telegram", post(test_notification_handler))
        .route_service("/favicon.ico", ServeFile::new(static_dir.join("favicon.ico")))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(fallback_handler);

    with_middleware(routes, state)
}

/// Wraps `routes` in the service middleware stack.
///
/// # Middleware (outermost first)
/// - Request id: set (UUID) and propagated as `x-request-id`
/// - Tracing, with the request id on the span
/// - Metrics and request logging
/// - Panic capture: logs, notifies and returns a 500 envelope
/// - Security headers and CORS
/// - Trusted host check
/// - Suspicious request screen
/// - Rate limiting
pub fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let mut router = routes
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn_with_state(state.clone(), screen_requests))
        .layer(from_fn_with_state(state.clone(), trusted_host))
        .layer(cors_layer(&state.config.allowed_origins));

    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    router
        .layer(CatchPanicLayer::custom(panic_handler(state.notifier.clone())))
        .layer(from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
