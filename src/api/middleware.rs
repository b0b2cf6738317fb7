//! Request middleware: host and request screening, rate limiting,
//! metrics/logging and panic capture.

use std::any::Any;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Response},
    middleware::Next,
    response::IntoResponse,
};
use tracing::{error, info, info_span, warn, Span};

use crate::api::routes::REQUEST_ID_HEADER;
use crate::api::AppState;
use crate::error::{ApiError, HOUR_REMAINING_HEADER, MINUTE_REMAINING_HEADER};
use crate::monitoring::RequestDescriptor;
use crate::notify::{messages, NotificationDispatcher};
use crate::ratelimit::{client_id, is_bypassed};

/// URL fragments that flag a request as an attack probe.
pub const SUSPICIOUS_PATTERNS: &[&str] = &[
    "script",
    "javascript:",
    "vbscript:",
    "onload=",
    "onerror=",
    "../",
    "..\\",
    "union select",
    "drop table",
    "insert into",
    "exec(",
    "eval(",
    "document.cookie",
    "window.location",
];

/// User-agent fragments of known scanners.
pub const SCANNER_AGENTS: &[&str] = &["sqlmap", "nikto", "nmap", "scanner"];

fn request_client(request: &Request) -> String {
    client_id(request.headers(), request.extensions())
}

fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Strips the port from a `Host` header value, keeping IPv6 brackets intact.
fn host_name(host: &str) -> &str {
    if host.starts_with('[') {
        return host.split_once(']').map_or(host, |(h, _)| &host[..=h.len()]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

// == Trusted Host ==
/// Rejects requests whose `Host` is not in the trusted list.
pub async fn trusted_host(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    if !state.config.trusts_any_host() {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(host_name)
            .unwrap_or_default();

        if !state
            .config
            .trusted_hosts
            .iter()
            .any(|trusted| trusted.eq_ignore_ascii_case(host))
        {
            warn!(host, "request for untrusted host");
            return Err(ApiError::UntrustedHost);
        }
    }
    Ok(next.run(request).await)
}

// == Suspicious Request Screen ==
/// True when the URL or user agent looks like an attack probe.
pub fn is_suspicious(path_and_query: &str, user_agent: &str) -> bool {
    let url = path_and_query.to_lowercase();
    let agent = user_agent.to_lowercase();
    SUSPICIOUS_PATTERNS.iter().any(|p| url.contains(p))
        || SCANNER_AGENTS.iter().any(|a| agent.contains(a))
}

/// Refuses blocked clients and blocks clients that send attack probes.
pub async fn screen_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    let client = request_client(&request);

    if state.blocked_ips.read().await.contains(&client) {
        warn!(client = %client, "request from blocked client");
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| request.uri().path());
    if is_suspicious(target, user_agent(request.headers())) {
        warn!(client = %client, target, "suspicious request, blocking client");
        state.blocked_ips.write().await.insert(client);
        return Err(ApiError::Forbidden(
            "Suspicious request detected".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

// == Rate Limit ==
/// Applies the per-client limiter and reports remaining quota.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    if is_bypassed(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let client = request_client(&request);
    let decision = state.limiter.lock().await.is_allowed(&client);
    if !decision.allowed {
        warn!(
            client = %client,
            path = %request.uri().path(),
            "rate limit exceeded"
        );
        return Err(ApiError::RateLimited(decision));
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        MINUTE_REMAINING_HEADER,
        HeaderValue::from(decision.minute_remaining),
    );
    headers.insert(HOUR_REMAINING_HEADER, HeaderValue::from(decision.hour_remaining));
    Ok(response)
}

// == Metrics and Logging ==
/// The `x-request-id` assigned to the request, or `-` before one is set.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// Span for `TraceLayer` carrying the request id.
pub fn request_span(request: &Request) -> Span {
    info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
        request_id = %request_id(request.headers()),
    )
}

/// Logs each request and feeds the metrics collector.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response<Body> {
    let started = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let descriptor = RequestDescriptor {
        path: request.uri().path().to_string(),
        method: request.method().to_string(),
        client_ip: request_client(&request),
        user_agent: user_agent(request.headers()).to_string(),
    };

    let response = next.run(request).await;
    let elapsed = started.elapsed();
    let status = response.status().as_u16();

    state
        .metrics
        .write()
        .await
        .record(&descriptor, status, elapsed);

    info!(
        request_id = %request_id,
        method = %descriptor.method,
        path = %descriptor.path,
        status,
        client = %descriptor.client_ip,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "request completed"
    );
    response
}

// == Panic Capture ==
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Builds the `CatchPanicLayer` handler: logs, notifies, returns a 500 envelope.
pub fn panic_handler(
    notifier: NotificationDispatcher,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response<Body> + Clone {
    move |panic| {
        let message = panic_message(panic.as_ref());
        error!(panic = %message, "request handler panicked");
        notifier.notify(messages::internal_error(&message));
        ApiError::Internal(message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspicious_patterns() {
        assert!(is_suspicious("/generate?q=<script>", ""));
        assert!(is_suspicious("/static/../../etc/passwd", ""));
        assert!(is_suspicious("/topics?id=1 UNION SELECT", ""));
        assert!(is_suspicious("/topics", "sqlmap/1.7"));
        assert!(is_suspicious("/topics", "Nikto"));
        assert!(!is_suspicious("/topics", "Mozilla/5.0"));
        assert!(!is_suspicious("/image/%D0%95%D0%B4%D0%B0", "curl/8.0"));
    }

    #[test]
    fn test_host_name() {
        assert_eq!(host_name("example.com:8000"), "example.com");
        assert_eq!(host_name("example.com"), "example.com");
        assert_eq!(host_name("[::1]:8000"), "[::1]");
    }

    #[test]
    fn test_request_id_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "-");
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
