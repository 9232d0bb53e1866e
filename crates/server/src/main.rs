use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soundshift_core::{
    load_config, load_config_or_default, validate_config, ConversionOrchestrator, Encoder,
    FfmpegEncoder,
};
use soundshift_server::{create_router, AppState, EncoderStatus};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file read when `SOUNDSHIFT_CONFIG` is unset; may be absent.
const DEFAULT_CONFIG_PATH: &str = "soundshift.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("soundshift {} starting", VERSION);

    // An explicit config path must exist; the default one is optional.
    let config = match std::env::var("SOUNDSHIFT_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
        Err(_) => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            info!("Loading configuration from {:?} if present", path);
            load_config_or_default(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
    };

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("ffmpeg binary: {:?}", config.encoder.ffmpeg_path);
    info!(
        "Worker pool size: {}",
        config.orchestrator.effective_parallelism()
    );

    // Probe once; a missing encoder keeps the server up but rejects batches.
    let encoder: Arc<dyn Encoder> = Arc::new(FfmpegEncoder::new(config.encoder.clone()));
    let startup_encoder = EncoderStatus::probe(encoder.as_ref()).await;

    let orchestrator = ConversionOrchestrator::new(config.orchestrator.clone(), encoder);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, orchestrator, startup_encoder));
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
