//! stats-job-server
//!
//! Concurrent HTTP job server that accepts statistical queries over a fixed
//! CDC nutrition/activity/obesity dataset, executes them on a pool of
//! worker threads, and lets clients poll for results by job id.
//!
//! # Environment variables
//!
//! - `BIND_ADDR`: HTTP listen address (default `0.0.0.0:8080`)
//! - `DATASET_PATH`: path to the source CSV dataset
//! - `RESULTS_DIR`: directory per-job result files are written under
//! - `EVENT_LOG_PATH`: path to the dedicated, rotated job-event log
//! - `TP_NUM_OF_THREADS`: worker thread count (default: hardware concurrency)
//! - `RUST_LOG`: ambient tracing filter (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stats_job_server::config::{AppConfig, CliArgs};
use stats_job_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();
    let config = AppConfig::from_args(args);

    info!(
        bind_addr = %config.bind_addr,
        num_threads = config.num_threads,
        dataset_path = %config.dataset_path,
        "starting stats-job-server"
    );

    let state = AppState::new(config.clone()).context("failed to initialize application state")?;
    let router = stats_job_server::api::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding to {}", config.bind_addr))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Idempotent: a client may already have hit /api/graceful_shutdown.
    state.request_shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
