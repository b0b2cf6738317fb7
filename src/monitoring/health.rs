//! Health checker with per-probe refresh intervals.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::AuthStore;

// == Probe Trait ==
/// A named health check. `Ok(false)` is unhealthy; `Err` is a probe error.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub checks: BTreeMap<String, ProbeResult>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

struct RegisteredProbe {
    probe: Arc<dyn HealthProbe>,
    interval: Duration,
    last_run: Option<Instant>,
    last_result: Option<ProbeResult>,
}

// == Health Checker ==
#[derive(Default)]
pub struct HealthChecker {
    probes: BTreeMap<String, RegisteredProbe>,
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthChecker")
            .field("probes", &self.probes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a probe that re-runs at most once per `interval`.
    pub fn add_check(
        &mut self,
        name: impl Into<String>,
        probe: impl HealthProbe + 'static,
        interval: Duration,
    ) {
        self.probes.insert(
            name.into(),
            RegisteredProbe {
                probe: Arc::new(probe),
                interval,
                last_run: None,
                last_result: None,
            },
        );
    }

    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Runs due probes and reports every probe's latest result.
    pub async fn check_all(&mut self) -> HealthReport {
        self.check_all_at(Instant::now()).await
    }

    pub async fn check_all_at(&mut self, now: Instant) -> HealthReport {
        let mut checks = BTreeMap::new();

        for (name, registered) in self.probes.iter_mut() {
            let due = match registered.last_run {
                Some(last) => now.saturating_duration_since(last) >= registered.interval,
                None => true,
            };

            if due || registered.last_result.is_none() {
                let result = run_probe(name, registered.probe.as_ref()).await;
                registered.last_run = Some(now);
                registered.last_result = Some(result);
            } else {
                debug!(probe = %name, "using cached health result");
            }

            if let Some(result) = &registered.last_result {
                checks.insert(name.clone(), result.clone());
            }
        }

        let status = if checks.values().all(|r| r.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        HealthReport {
            status,
            timestamp: Utc::now(),
            checks,
        }
    }
}

async fn run_probe(name: &str, probe: &dyn HealthProbe) -> ProbeResult {
    let (status, details) = match probe.check().await {
        Ok(true) => (HealthStatus::Healthy, None),
        Ok(false) => {
            warn!(probe = %name, "health probe reported unhealthy");
            (HealthStatus::Unhealthy, None)
        }
        Err(e) => {
            warn!(probe = %name, error = %e, "health probe failed");
            (HealthStatus::Error, Some(e.to_string()))
        }
    };

    ProbeResult {
        status,
        timestamp: Utc::now(),
        details,
    }
}

// == Built-in Probes ==

/// Healthy while the user table holds at least one account.
pub struct UserStoreProbe(pub Arc<AuthStore>);

#[async_trait]
impl HealthProbe for UserStoreProbe {
    async fn check(&self) -> anyhow::Result<bool> {
        Ok(!self.0.is_empty().await)
    }
}

/// Healthy when both upstream provider keys are configured.
pub struct ExternalApiProbe {
    pub text_configured: bool,
    pub image_configured: bool,
}

#[async_trait]
impl HealthProbe for ExternalApiProbe {
    async fn check(&self) -> anyhow::Result<bool> {
        Ok(self.text_configured && self.image_configured)
    }
}

/// Healthy when a scratch file can be written to `dir`.
pub struct DiskSpaceProbe {
    pub dir: PathBuf,
}

#[async_trait]
impl HealthProbe for DiskSpaceProbe {
    async fn check(&self) -> anyhow::Result<bool> {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let path = self
            .dir
            .join(format!(".health-probe-{}-{seq}", std::process::id()));
        tokio::fs::write(&path, b"ok").await?;
        tokio::fs::remove_file(&path).await?;
        Ok(true)
    }
}

/// Wraps a synchronous closure as a probe.
pub struct FnProbe<F>(pub F);

impl<F> FnProbe<F>
where
    F: Fn() -> anyhow::Result<bool> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> HealthProbe for FnProbe<F>
where
    F: Fn() -> anyhow::Result<bool> + Send + Sync,
{
    async fn check(&self) -> anyhow::Result<bool> {
        (self.0)()
    }
}
