use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stemsplit_core::{
    create_blob_store, create_registry, create_separator, load_config, validate_config,
    ConnectionRegistry, Presigner, Separator, SigV4Presigner,
};
use stemsplit_server::{create_router, AppState};

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

    let config_path = std::env::var("STEMSPLIT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(config_hash = &config_hash[..16], "Configuration loaded");

    let registry: Arc<dyn ConnectionRegistry> = Arc::from(
        create_registry(&config.registry).context("Failed to open connection registry")?,
    );
    info!("Connection registry: {}", registry.backend_name());

    let blob_store =
        create_blob_store(&config.storage).context("Failed to create blob store")?;
    info!(
        "Blob store: {} (public host {})",
        blob_store.name(),
        config.storage.public_host()
    );

    let separator: Arc<dyn Separator> = Arc::from(create_separator(&config.separator));
    separator
        .validate()
        .await
        .with_context(|| format!("Separator '{}' is not usable", separator.name()))?;
    info!("Separator: {}", separator.name());

    let presigner: Arc<dyn Presigner> = Arc::new(
        SigV4Presigner::from_config(&config.storage).context("Failed to create presigner")?,
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(
        config, registry, blob_store, separator, presigner,
    ));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
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
