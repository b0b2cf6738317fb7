//! Sliding-window rate limiter.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::warn;

use crate::cache::current_timestamp_ms;
use crate::ratelimit::{HOUR_WINDOW_MS, MINUTE_WINDOW_MS};

// == Decision ==
/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateDecision {
    pub allowed: bool,
    pub minute_remaining: u32,
    pub hour_remaining: u32,
}

// == Client Windows ==
#[derive(Debug, Default)]
struct ClientWindows {
    minute: VecDeque<u64>,
    hour: VecDeque<u64>,
}

impl ClientWindows {
    fn prune(&mut self, now_ms: u64) {
        prune_window(&mut self.minute, now_ms, MINUTE_WINDOW_MS);
        prune_window(&mut self.hour, now_ms, HOUR_WINDOW_MS);
    }

    fn is_empty(&self) -> bool {
        self.minute.is_empty() && self.hour.is_empty()
    }
}

/// Drops timestamps that fell out of the trailing window.
///
/// Timestamps are appended in order, so expired ones sit at the front.
fn prune_window(window: &mut VecDeque<u64>, now_ms: u64, length_ms: u64) {
    while let Some(&oldest) = window.front() {
        if now_ms.saturating_sub(oldest) >= length_ms {
            window.pop_front();
        } else {
            break;
        }
    }
}

// == Rate Limiter ==
/// Per-client limiter over a minute window and an hour window.
///
/// A request is counted in both windows only when both have room.
#[derive(Debug)]
pub struct RateLimiter {
    per_minute: u32,
    per_hour: u32,
    clients: HashMap<String, ClientWindows>,
}

impl RateLimiter {
    pub fn new(per_minute: u32, per_hour: u32) -> Self {
        Self {
            per_minute,
            per_hour,
            clients: HashMap::new(),
        }
    }

    /// Checks and, if allowed, records a request for `client` at the current time.
    pub fn is_allowed(&mut self, client: &str) -> RateDecision {
        self.is_allowed_at(client, current_timestamp_ms())
    }

    /// Same as [`is_allowed`](Self::is_allowed) with an explicit clock reading.
    pub fn is_allowed_at(&mut self, client: &str, now_ms: u64) -> RateDecision {
        let windows = self.clients.entry(client.to_string()).or_default();
        windows.prune(now_ms);

        let minute_count = windows.minute.len() as u32;
        let hour_count = windows.hour.len() as u32;

        if minute_count < self.per_minute && hour_count < self.per_hour {
            windows.minute.push_back(now_ms);
            windows.hour.push_back(now_ms);
            return RateDecision {
                allowed: true,
                minute_remaining: self.per_minute - minute_count - 1,
                hour_remaining: self.per_hour - hour_count - 1,
            };
        }

        warn!(client, minute_count, hour_count, "rate limit exceeded");
        RateDecision {
            allowed: false,
            minute_remaining: self.per_minute.saturating_sub(minute_count),
            hour_remaining: self.per_hour.saturating_sub(hour_count),
        }
    }

    /// Forgets clients whose windows have fully drained. Returns how many were dropped.
    pub fn prune_idle(&mut self) -> usize {
        self.prune_idle_at(current_timestamp_ms())
    }

    pub fn prune_idle_at(&mut self, now_ms: u64) -> usize {
        let before = self.clients.len();
        self.clients.retain(|_, windows| {
            windows.prune(now_ms);
            !windows.is_empty()
        });
        before - self.clients.len()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn limits(&self) -> (u32, u32) {
        (self.per_minute, self.per_hour)
    }
}
