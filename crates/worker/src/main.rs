use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern_core::{
    load_config, validate_config, FfmpegTranscoder, LessonStore, PipelineWorker,
    SqliteLessonStore, Transcoder, VideoPipeline,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("lectern {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("LECTERN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Storage root: {:?}", config.pipeline.storage_root);

    // Create SQLite lesson store
    let store: Arc<dyn LessonStore> = Arc::new(
        SqliteLessonStore::new(&config.database.path).context("Failed to create lesson store")?,
    );
    info!("Lesson store initialized");

    // Probe the encoder once at startup. A failed probe is not fatal:
    // every attempt re-checks and records the failure on the lesson.
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    if let Err(e) = transcoder.validate().await {
        warn!("Encoder probe failed: {}", e);
    }

    // Create pipeline and worker
    let pipeline = Arc::new(VideoPipeline::new(
        config.pipeline.clone(),
        Arc::clone(&transcoder),
        Arc::clone(&store),
    ));
    let worker = PipelineWorker::new(config.worker.clone(), pipeline, Arc::clone(&store));

    if config.worker.enabled {
        worker.start().await;
        info!("Pipeline worker started");
    } else {
        info!("Worker disabled in config");
    }

    // Run until shutdown
    shutdown_signal().await;
    info!("Shutting down...");

    worker.stop().await;
    info!("Pipeline worker stopped");

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
