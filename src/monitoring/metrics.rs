//! Request metrics collector.
//!
//! Keeps a bounded history of request records plus incrementally maintained
//! aggregates, so summaries never replay the full history except for the
//! requests-per-minute scan.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the collector needs to know about an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: String,
    pub client_ip: String,
    pub user_agent: String,
}

/// One completed request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetric {
    pub path: String,
    pub method: String,
    pub status_code: u16,
    /// Seconds
    pub response_time: f64,
    pub timestamp: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent: String,
}

/// Aggregates returned by `GET /metrics`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub uptime_seconds: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Percentage
    pub success_rate: f64,
    /// Seconds, rounded to milliseconds
    pub average_response_time: f64,
    pub requests_per_minute: usize,
    pub unique_clients: usize,
    pub top_endpoints: Vec<(String, u64)>,
    pub error_distribution: HashMap<String, u64>,
}

#[derive(Debug)]
pub struct MetricsCollector {
    max_history: usize,
    history: VecDeque<RequestMetric>,
    started_at: DateTime<Utc>,
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    average_response_time: f64,
    unique_clients: HashSet<String>,
    endpoint_usage: HashMap<String, u64>,
    error_counts: HashMap<String, u64>,
}

impl MetricsCollector {
    /// Number of endpoints listed in a summary.
    const TOP_ENDPOINTS: usize = 5;

    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            history: VecDeque::with_capacity(max_history.min(4096)),
            started_at: Utc::now(),
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            average_response_time: 0.0,
            unique_clients: HashSet::new(),
            endpoint_usage: HashMap::new(),
            error_counts: HashMap::new(),
        }
    }

    /// Records a finished request.
    pub fn record(&mut self, request: &RequestDescriptor, status_code: u16, duration: Duration) {
        self.record_at(request, status_code, duration, Utc::now());
    }

    pub fn record_at(
        &mut self,
        request: &RequestDescriptor,
        status_code: u16,
        duration: Duration,
        timestamp: DateTime<Utc>,
    ) {
        let metric = RequestMetric {
            path: request.path.clone(),
            method: request.method.clone(),
            status_code,
            response_time: duration.as_secs_f64(),
            timestamp,
            client_ip: request.client_ip.clone(),
            user_agent: request.user_agent.clone(),
        };

        self.update_aggregates(&metric);

        if self.history.len() == self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(metric);
    }

    fn update_aggregates(&mut self, metric: &RequestMetric) {
        self.total_requests += 1;

        if (200..400).contains(&metric.status_code) {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }

        // Running mean: avg_n = avg_{n-1} + (x - avg_{n-1}) / n
        let n = self.total_requests as f64;
        self.average_response_time += (metric.response_time - self.average_response_time) / n;

        self.unique_clients.insert(metric.client_ip.clone());

        let endpoint = format!("{} {}", metric.method, metric.path);
        *self.endpoint_usage.entry(endpoint).or_insert(0) += 1;

        if metric.status_code >= 400 {
            *self
                .error_counts
                .entry(metric.status_code.to_string())
                .or_insert(0) += 1;
        }
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    /// Records newer than `minutes` ago, oldest first.
    pub fn recent_requests(&self, minutes: i64) -> Vec<RequestMetric> {
        let cutoff = Utc::now() - chrono::Duration::minutes(minutes);
        self.history
            .iter()
            .filter(|m| m.timestamp > cutoff)
            .cloned()
            .collect()
    }

    pub fn requests_per_minute(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::minutes(1);
        self.history.iter().filter(|m| m.timestamp > cutoff).count()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn summary(&self) -> MetricsSummary {
        let success_rate = if self.total_requests > 0 {
            self.successful_requests as f64 / self.total_requests as f64 * 100.0
        } else {
            0.0
        };

        let mut top_endpoints: Vec<(String, u64)> = self
            .endpoint_usage
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        top_endpoints.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_endpoints.truncate(Self::TOP_ENDPOINTS);

        MetricsSummary {
            uptime_seconds: self.uptime().num_milliseconds() as f64 / 1000.0,
            total_requests: self.total_requests,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            success_rate,
            average_response_time: (self.average_response_time * 1000.0).round() / 1000.0,
            requests_per_minute: self.requests_per_minute(),
            unique_clients: self.unique_clients.len(),
            top_endpoints,
            error_distribution: self.error_counts.clone(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, path: &str, ip: &str) -> RequestDescriptor {
        RequestDescriptor {
            path: path.to_string(),
            method: method.to_string(),
            client_ip: ip.to_string(),
            user_agent: "test-agent".to_string(),
        }
    }

    #[test]
    fn test_counts_and_average() {
        let mut collector = MetricsCollector::new(100);
        collector.record(&request("GET", "/topics", "1.1.1.1"), 200, Duration::from_millis(100));
        collector.record(&request("POST", "/generate", "1.1.1.1"), 500, Duration::from_millis(300));
        collector.record(&request("GET", "/topics", "2.2.2.2"), 304, Duration::from_millis(200));

        let summary = collector.summary();
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.successful_requests, 2);
        assert_eq!(summary.failed_requests, 1);
        assert!((summary.average_response_time - 0.2).abs() < 1e-9);
        assert!((summary.success_rate - 66.666).abs() < 0.01);
        assert_eq!(summary.unique_clients, 2);
        assert_eq!(summary.error_distribution.get("500"), Some(&1));
        assert_eq!(summary.top_endpoints[0], ("GET /topics".to_string(), 2));
        assert_eq!(summary.requests_per_minute, 3);
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut collector = MetricsCollector::new(3);
        for i in 0..5 {
            collector.record(&request("GET", &format!("/p{i}"), "ip"), 200, Duration::ZERO);
        }

        assert_eq!(collector.history_len(), 3);
        let paths: Vec<String> = collector.recent_requests(5).into_iter().map(|m| m.path).collect();
        assert_eq!(paths, vec!["/p2", "/p3", "/p4"]);
        // Aggregates still cover every request
        assert_eq!(collector.summary().total_requests, 5);
    }

    #[test]
    fn test_requests_per_minute_ignores_old_records() {
        let mut collector = MetricsCollector::new(10);
        let old = Utc::now() - chrono::Duration::minutes(2);
        collector.record_at(&request("GET", "/", "ip"), 200, Duration::ZERO, old);
        collector.record(&request("GET", "/", "ip"), 200, Duration::ZERO);

        assert_eq!(collector.requests_per_minute(), 1);
        assert_eq!(collector.recent_requests(5).len(), 2);
    }

    #[test]
    fn test_top_endpoints_capped() {
        let mut collector = MetricsCollector::new(100);
        for i in 0..8 {
            collector.record(&request("GET", &format!("/e{i}"), "ip"), 404, Duration::ZERO);
        }

        let summary = collector.summary();
        assert_eq!(summary.top_endpoints.len(), 5);
        assert_eq!(summary.error_distribution.get("404"), Some(&8));
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = MetricsCollector::default().summary();
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.average_response_time, 0.0);
    }
}
