//! Blog Generator - HTTP service entry point

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use blog_generator::{create_router, spawn_cleanup_task, AppState, Config};

/// Main entry point for the blog generator service.
///
/// # Startup Sequence
/// 1. Load `.env` and configuration from the environment
/// 2. Initialize tracing (plain or JSON)
/// 3. Build application state (providers, users, cache, limiter, monitoring)
/// 4. Start the background cleanup task
/// 5. Serve HTTP with peer addresses available to the rate limiter
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set variables directly
    let dotenv = dotenvy::dotenv();

    let config = Config::from_env();
    init_tracing(config.json_logs);

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }
    info!("Starting Blog Generator");
    info!(
        port = config.server_port,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        rate_limit_per_minute = config.rate_limit_per_minute,
        rate_limit_per_hour = config.rate_limit_per_hour,
        "Configuration loaded"
    );

    let port = config.server_port;
    let cleanup_interval = config.cleanup_interval;
    let state = AppState::from_config(config)
        .await
        .context("failed to build application state")?;

    let cleanup_handle = spawn_cleanup_task(
        state.cache.clone(),
        state.limiter.clone(),
        cleanup_interval,
    );
    info!("Background cleanup task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cleanup_handle))
    .await
    .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Installs the global subscriber.
///
/// Defaults to `blog_generator=info,tower_http=info`; `RUST_LOG` overrides.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_generator=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
