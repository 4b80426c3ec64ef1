//! Domoticz Exporter Server
//!
//! This crate bridges Domoticz, which pushes one reading per HTTP POST, to
//! Prometheus, which periodically scrapes the current value of every metric.
//!
//! # Architecture
//!
//! The server is built on Axum and Tokio:
//! - the push route decodes a report, names it, and hands it to the update worker
//! - the update worker is the only writer of the sample store; it also sweeps
//!   samples that stopped being updated
//! - the scrape route renders the store through a Prometheus collector that
//!   filters expired samples itself
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
pub mod metrics;
mod routes;
mod state;
pub mod worker;

pub use config::{Config, ConfigError, LogFormat};
pub use state::AppState;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Runs the exporter.
///
/// This function loads configuration from the command line and environment
/// and starts listening for incoming connections. It handles graceful shutdown
/// on SIGTERM/SIGINT signals.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::load()?;
    run_server_with_config(config).await
}

/// Runs the exporter with the provided configuration.
///
/// This is useful for testing or when you want to provide configuration programmatically.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let (state, worker) = AppState::from_config(&config)?;
    let addr = config.bind_address();

    tracing::info!(
        listen_address = %config.listen_address,
        metrics_path = %config.metrics_path,
        push_path = %config.push_path,
        staleness_window_secs = config.staleness_window_secs,
        "Domoticz exporter starting"
    );

    let app = create_router(state, &config);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(addr = %listener.local_addr()?, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last state clones; the worker drains and stops.
    worker.await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
/// Route paths must already have been checked with [`Config::validate`].
pub fn create_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .merge(routes::health_routes(state.clone()))
        .merge(routes::push_routes(state.clone(), &config.push_path))
        .merge(routes::scrape_routes(state, &config.metrics_path))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
