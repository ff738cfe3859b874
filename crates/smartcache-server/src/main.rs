//! SmartCache Server
//!
//! Standalone breached-email server binary.

use anyhow::Context;
use clap::Parser;
use smartcache_core::{init_telemetry, SmartCacheConfig, StorageBackend, TelemetryConfig};
use smartcache_runtime::{RuntimeBuilder, RuntimeConfig};
use smartcache_server::api;
use smartcache_server::security::ApiKeyAuth;
use smartcache_server::{AppState, BreachService};
use smartcache_storage::{FileStore, MemoryStore, StateStore};
use std::path::PathBuf;
use std::sync::Arc;

/// SmartCache server CLI
#[derive(Parser, Debug)]
#[command(name = "smartcache-server")]
#[command(about = "Breached email lookup service backed by per-key actors")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// API key required in the X-API-Key header
    #[arg(long, env = "SMARTCACHE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory for the file store, selects the file backend
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<SmartCacheConfig> {
        let mut config = match &self.config {
            Some(path) => SmartCacheConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SmartCacheConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(key) = &self.api_key {
            config.server.api_key = Some(key.clone());
        }
        if let Some(dir) = &self.data_dir {
            config.storage.backend = StorageBackend::File;
            config.storage.data_dir = Some(dir.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

async fn open_store(config: &SmartCacheConfig) -> anyhow::Result<Arc<dyn StateStore>> {
    match (&config.storage.backend, &config.storage.data_dir) {
        (StorageBackend::File, Some(dir)) => {
            tracing::info!(data_dir = %dir.display(), "Using file store");
            Ok(Arc::new(FileStore::open(dir).await?))
        }
        (StorageBackend::File, None) => anyhow::bail!("file backend requires storage.data_dir"),
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory store, state will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    init_telemetry(&TelemetryConfig::new("smartcache-server").with_log_level(level))?;

    let config = cli.load_config()?;
    tracing::info!(
        bind = %config.server.bind_address,
        backend = ?config.storage.backend,
        "SmartCache server starting"
    );

    let store = open_store(&config).await?;
    let runtime = Arc::new(
        RuntimeBuilder::new()
            .with_store(store)
            .with_config(RuntimeConfig::from(&config))
            .build()?,
    );
    runtime.start()?;

    let state = AppState::new(BreachService::new(runtime.clone()));
    let app = api::router(state, ApiKeyAuth::new(config.server.api_key.clone()));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("binding {}", config.server.bind_address))?;
    tracing::info!(addr = %config.server.bind_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    runtime.stop().await?;
    tracing::info!("SmartCache server stopped");
    Ok(())
}
