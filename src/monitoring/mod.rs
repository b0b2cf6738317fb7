//! Monitoring Module
//!
//! Request metrics ring buffer and interval-cached health probes.

mod health;
mod metrics;

pub use health::{
    DiskSpaceProbe, ExternalApiProbe, FnProbe, HealthChecker, HealthProbe, HealthReport,
    HealthStatus, ProbeResult, UserStoreProbe,
};
pub use metrics::{MetricsCollector, MetricsSummary, RequestDescriptor, RequestMetric};
