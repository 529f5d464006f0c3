//! overhead-tracker - aircraft overhead announcer
//!
//! Polls the ADS-B feed on a fixed interval, records every sighting, and
//! announces aircraft that pass over the geofence. The read API is served
//! from the same process over the same store.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use overhead_api::{build_router, AppState};
use overhead_common::config::{resolve_db_path, Settings, DB_PATH_ENV};
use overhead_common::db::PositionStore;
use overhead_tracker::correlation::{CorrelationClient, FlightRadarClient};
use overhead_tracker::feed::AdsbFeedClient;
use overhead_tracker::message::NameDirectory;
use overhead_tracker::notify::{LogNotifier, Notifier, WebhookNotifier};
use overhead_tracker::{CycleConfig, IngestionCycle};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for overhead-tracker
#[derive(Parser, Debug)]
#[command(name = "overhead-tracker")]
#[command(about = "Announces aircraft passing overhead")]
#[command(version)]
struct Args {
    /// Port the read API listens on
    #[arg(short, long, default_value = "3000", env = "OVERHEAD_PORT")]
    port: u16,

    /// Position database (defaults to flights.db next to the executable)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Public base URL used for links in announcements
    #[arg(long, default_value = "http://localhost:3000", env = "BASEURL")]
    base_url: String,

    /// Feed search radius around the configured centre
    #[arg(long, default_value = "15", env = "SEARCH_RADIUS")]
    search_radius: f64,

    /// TOML settings file
    #[arg(short, long, env = "OVERHEAD_CONFIG")]
    config: Option<PathBuf>,

    /// Webhook that receives announcements; logged only when unset
    #[arg(long, env = "NOTIFY_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Bearer token for the webhook
    #[arg(long, env = "NOTIFY_WEBHOOK_TOKEN", hide_env_values = true)]
    webhook_token: Option<String>,

    /// GeoJSON snapshot written every cycle
    #[arg(long, default_value = "flights.geo.json", env = "GEOJSON_PATH")]
    geojson_path: PathBuf,

    /// Disable the GeoJSON snapshot
    #[arg(long)]
    no_geojson: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "overhead_tracker=info,overhead_api=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting overhead-tracker v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let db_path = resolve_db_path(args.db_path.as_deref(), DB_PATH_ENV, &settings);
    info!("Database path: {}", db_path.display());

    // Writes issued before this finishes wait on the same initialization
    let store = PositionStore::new(&db_path);
    {
        let store = store.clone();
        tokio::spawn(async move {
            match store.ready().await {
                Ok(()) => info!("✓ Database ready"),
                Err(e) => error!("Database initialization failed: {}", e),
            }
        });
    }

    let directory = NameDirectory::load(
        settings.airports_file.as_deref(),
        settings.airlines_file.as_deref(),
    )
    .context("Failed to load name tables")?;

    let feed = AdsbFeedClient::new(&settings.feed, args.search_radius)
        .context("Failed to build feed client")?;
    info!("Feed: {}", feed.url());

    let flight_source = FlightRadarClient::new(&settings.correlation)
        .context("Failed to build correlation client")?;
    let correlation = CorrelationClient::new(Arc::new(flight_source), &settings.correlation);

    let notifier: Arc<dyn Notifier> = match &args.webhook_url {
        Some(url) => {
            info!("Posting announcements to {}", url);
            Arc::new(
                WebhookNotifier::new(url.clone(), args.webhook_token.clone())
                    .context("Failed to build webhook client")?,
            )
        }
        None => {
            info!("No webhook configured, announcements are logged only");
            Arc::new(LogNotifier)
        }
    };

    let geojson_path = (!args.no_geojson).then(|| args.geojson_path.clone());
    let config = CycleConfig::from_settings(&settings, args.base_url.clone(), geojson_path)
        .context("Invalid cycle configuration")?;

    let cycle = Arc::new(IngestionCycle::new(
        config,
        Arc::new(feed),
        store.clone(),
        Arc::new(correlation),
        notifier,
        Arc::new(directory),
    ));
    let scheduler = cycle.spawn_scheduler(Duration::from_secs(settings.poll_interval_secs));

    let app = build_router(AppState::from_settings(store, &settings));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Read API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    scheduler.abort();
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
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
