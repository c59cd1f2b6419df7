//! File Cache - A filesystem-backed key/value cache
//!
//! Serves a file cache over HTTP.

use std::net::SocketAddr;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use file_cache::api::create_router;
use file_cache::config::CodecKind;
use file_cache::{AppState, Config, FileCache, LiteralCodec, PayloadCodec};

/// Main entry point for the file cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the file cache with the configured namespace and codec
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "file_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting File Cache Server");

    // Load configuration from environment variables
    let config = Config::from_env();
    let cache_config = match config.cache_config() {
        Ok(cache_config) => cache_config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Configuration loaded: root={}, layout={:?}, default_ttl={}s, codec={:?}, port={}",
        cache_config.root_directory().display(),
        cache_config.layout,
        config.default_ttl,
        config.codec,
        config.server_port
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let result = match config.codec {
        CodecKind::Json => serve(FileCache::new(cache_config), addr).await,
        CodecKind::Literal => serve(FileCache::with_codec(cache_config, LiteralCodec), addr).await,
    };

    if let Err(e) = result {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Binds `addr` and serves `cache` until a shutdown signal arrives.
async fn serve<C: PayloadCodec>(cache: FileCache<C>, addr: SocketAddr) -> std::io::Result<()> {
    let app = create_router(AppState::new(cache));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
