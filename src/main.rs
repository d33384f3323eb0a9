use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use polygon_core::{AppState, Config, api, build_router, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Polygon Core v{}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the service, returning an exit code on error.
///
/// Configuration and bind validation happen before the accept loop starts;
/// any failure there is unrecoverable and terminates the process with a
/// diagnostic. After that point, per-request failures stay inside the
/// admission pipeline.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        environment = config.environment.as_str(),
        max_requests = config.rate_limit_max_requests,
        window_secs = config.rate_limit_window.as_secs(),
        health_path = %config.health_path,
        "Configuration loaded"
    );

    // Build the admission pipeline around the mounted API
    let state = AppState::new(config.clone());
    let app = build_router(&config, api::v1::router(state));

    // Bind the listener
    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address {:?}: {e}", config.server_addr());
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Polygon Core started at http://{addr}");
    info!("  *    {}           - Liveness probe", config.health_path);
    info!("  *    /api/v1/*         - Versioned API");

    // Serve until a shutdown signal arrives, then drain
    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}
