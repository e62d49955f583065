use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use item_cache_service::cache::{CacheClient, MemoryStore};
use item_cache_service::config::{CacheBackend, Cli, Config, ConfigSource};
use item_cache_service::items::MemoryItemStore;
use item_cache_service::server::{build_router, AppState};
use item_cache_service::telemetry::{self, metrics::Metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Load configuration, then environment overrides, then CLI overrides.
    let (mut config, source) = Config::load(&cli.config)?;
    config.apply_env()?;
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }

    // Initialize tracing/logging.
    telemetry::init_tracing(&config.logging, cli.verbose);

    if source == ConfigSource::Defaults {
        warn!("Config file not found at {:?}, using defaults", cli.config);
    }

    info!(
        service = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.app.environment,
        "Starting service"
    );
    info!(
        backend = ?config.cache.backend,
        entity_ttl_secs = config.cache.entity_ttl_secs,
        redis_pool_size = config.redis.pool_size,
        "Configuration loaded"
    );

    let config = Arc::new(config);
    let metrics = Arc::new(Metrics::new()?);

    // Connect the cache. A cache outage degrades the service but never stops it.
    let cache = Arc::new(CacheClient::new(config.redis.timeout()));
    match config.cache.backend {
        CacheBackend::Redis => {
            if let Err(e) = cache.connect(&config.redis).await {
                warn!(error = %e, "Redis unavailable, continuing without cache");
            }
        }
        CacheBackend::Memory => {
            cache.attach(Arc::new(MemoryStore::new())).await;
            info!("Using in-process cache");
        }
        CacheBackend::Disabled => info!("Cache disabled"),
    }

    // Build application state and router.
    let store = Arc::new(MemoryItemStore::new());
    let state = AppState::new(config.clone(), store, cache.clone(), metrics);
    let app = build_router(state);

    // Start the server.
    let listen_addr = config.server.listen.clone();
    info!(addr = %listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cache.disconnect().await;
    info!("Shutdown complete");

    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl-C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
