//! overhead-api - standalone historical track server
//!
//! Serves the read API over an existing position database without running
//! ingestion. The database is opened read-only.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use overhead_api::{build_router, AppState};
use overhead_common::config::{resolve_db_path, Settings, DB_PATH_ENV};
use overhead_common::db::PositionStore;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for overhead-api
#[derive(Parser, Debug)]
#[command(name = "overhead-api")]
#[command(about = "Read-only API over recorded aircraft tracks")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "OVERHEAD_PORT")]
    port: u16,

    /// Position database (defaults to flights.db next to the executable)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// TOML settings file
    #[arg(short, long, env = "OVERHEAD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "overhead_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting overhead-api v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let db_path = resolve_db_path(args.db_path.as_deref(), DB_PATH_ENV, &settings);
    info!("Database path: {}", db_path.display());

    let store = PositionStore::read_only(&db_path);
    store
        .ready()
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("✓ Connected to database (read-only)");

    let app = build_router(AppState::from_settings(store, &settings));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("overhead-api listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
