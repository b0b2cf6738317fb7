//! Rate Limiting Module
//!
//! Per-client sliding windows over the last minute and the last hour.

mod client;
mod limiter;


pub use client::{client_id, UNKNOWN_CLIENT};
pub use limiter::{RateDecision, RateLimiter};

/// Length of the short window in milliseconds
pub const MINUTE_WINDOW_MS: u64 = 60_000;

/// Length of the long window in milliseconds
pub const HOUR_WINDOW_MS: u64 = 3_600_000;

/// Seconds a denied client is told to wait
pub const RETRY_AFTER_SECS: u64 = 60;

/// Paths that are never rate limited
pub const BYPASS_PATHS: &[&str] = &["/", "/health", "/favicon.ico"];

/// Returns true when `path` skips the limiter.
pub fn is_bypassed(path: &str) -> bool {
    BYPASS_PATHS.contains(&path) || path.starts_with("/static/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bypass_paths() {
        assert!(is_bypassed("/"));
        assert!(is_bypassed("/health"));
        assert!(is_bypassed("/static/app.css"));
        assert!(is_bypassed("/favicon.ico"));
        assert!(!is_bypassed("/generate"));
        assert!(!is_bypassed("/healthz"));
    }
}
