//! scorm-server - SCORM package ingestion and runtime tracking service
//!
//! Accepts zip packages over HTTP, maps their manifests to digital courses,
//! validates and stores them, records learner progress, and serves the
//! session-based runtime API used by SCOs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scorm_common::config::{load_toml_config, LoggingConfig, RootFolderInitializer, RootFolderResolver};
use scorm_server::{AppState, StorageDirs, DEFAULT_MAX_UPLOAD_BYTES, MODULE_NAME};

/// Command-line arguments for scorm-server
#[derive(Parser, Debug)]
#[command(name = "scorm-server")]
#[command(about = "SCORM package ingestion and runtime tracking service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SCORM_PORT")]
    port: Option<u16>,

    /// Root folder holding the database, uploads and extracted packages
    #[arg(short, long, env = "SCORM_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: std::net::IpAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_toml_config(MODULE_NAME);

    init_tracing(&config.logging)?;

    info!("Starting {} v{}", MODULE_NAME, env!("CARGO_PKG_VERSION"));

    // Root folder: CLI > env > TOML > compiled default
    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = scorm_server::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;

    let max_upload_bytes = config.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
    let state = AppState::new(db_pool, StorageDirs::from_root(&initializer))
        .with_max_upload_bytes(max_upload_bytes);

    let app = scorm_server::build_router(state);

    let port = args.port.or(config.port).unwrap_or(scorm_server::DEFAULT_PORT);
    let addr = SocketAddr::new(args.bind, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the TOML level; an optional log file gets a second,
/// non-ANSI layer
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
