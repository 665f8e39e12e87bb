//! Hubscrape - GitHub profile scraping API
//!
//! Exposes scraping of GitHub profile and repository data over HTTP, with
//! synchronous cache-backed reads, asynchronous background jobs, and
//! multi-format export of completed results.

mod api;
mod cache;
mod config;
mod error;
mod export;
mod jobs;
mod models;
mod scrape;
mod tasks;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use tasks::{spawn_cache_cleanup_task, spawn_job_cleanup_task};

/// Main entry point for the scraping API server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build application state (cache, job manager, export coordinator)
/// 4. Start background cache and job cleanup tasks
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hubscrape=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hubscrape API Server");

    // Invalid configuration is fatal before anything is wired up
    let config = Config::from_env();
    config.validate().context("configuration rejected")?;
    info!(
        "Configuration loaded: cache_max_entries={}, cache_ttl={}s, max_concurrent_jobs={}, job_timeout={}s, port={}",
        config.cache_max_entries,
        config.cache_ttl,
        config.max_concurrent_jobs,
        config.job_timeout,
        config.server_port
    );

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("cannot create output dir {}", config.output_dir.display()))?;
    info!("Export directory ready: {}", config.output_dir.display());

    let state = AppState::from_config(&config).context("failed to build application state")?;
    info!("Application state initialized");

    // Background maintenance
    let cache_cleanup = spawn_cache_cleanup_task(state.cache.clone(), config.cache_cleanup_interval);
    let job_cleanup = spawn_job_cleanup_task(
        state.jobs.clone(),
        config.job_cleanup_interval,
        config.job_retention_secs,
    );
    info!("Background cleanup tasks started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(vec![cache_cleanup, job_cleanup]))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the maintenance tasks and allows graceful
/// shutdown.
async fn shutdown_signal(task_handles: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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

    for handle in task_handles {
        handle.abort();
    }
    warn!("Maintenance tasks aborted");
}
