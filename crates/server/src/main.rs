use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bgstreams_core::metadata::{CinemetaClient, MetadataProvider};
use bgstreams_core::probe::{HealthProber, UdpScrapeProber};
use bgstreams_core::transport::{HttpRelay, WorkerRelay};
use bgstreams_core::{
    build_sources, load_config, load_config_from_env, validate_config, Aggregator, CacheSweeper,
    StreamCaches,
};

use bgstreams_server::api::create_router;
use bgstreams_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("BGSTREAMS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No config file at {:?}, using defaults and environment", config_path);
        load_config_from_env().context("Failed to load config from environment")?
    };
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        default_sources = ?config.sources.default_enabled,
        relay = config.relay.is_some(),
        probe = config.probe.enabled,
        "Configuration loaded"
    );

    let caches = Arc::new(StreamCaches::new(&config.cache));
    let sweeper = CacheSweeper::new(Arc::clone(&caches), config.cache.sweep_interval());
    sweeper.start().await;

    let prober: Option<Arc<dyn HealthProber>> = if config.probe.enabled {
        Some(Arc::new(UdpScrapeProber::from_config(&config.probe)))
    } else {
        None
    };

    let relay: Option<Arc<dyn HttpRelay>> = match &config.relay {
        Some(relay_config) => {
            info!("Using relay at {}", relay_config.url);
            Some(Arc::new(
                WorkerRelay::new(relay_config).context("Failed to create relay client")?,
            ))
        }
        None => {
            warn!("No relay configured; geo-restricted sources are limited");
            None
        }
    };

    let metadata: Arc<dyn MetadataProvider> = Arc::new(
        CinemetaClient::new(&config.metadata).context("Failed to create metadata client")?,
    );

    let sources = build_sources(&config, Arc::clone(&caches), prober, relay)
        .context("Failed to build source adapters")?;
    let aggregator = Aggregator::new(metadata, sources);
    info!(sources = ?aggregator.available(), "Source adapters ready");

    let state = Arc::new(AppState::new(config.clone(), aggregator, Arc::clone(&caches)));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    sweeper.stop().await;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
