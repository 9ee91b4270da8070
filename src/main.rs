mod api_doc;
mod app;
mod config;
mod error;
mod handlers;
mod memory;
mod models;
mod password;
mod routes;
mod spanner;
mod state;
mod store;
mod validation;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use config::{Config, StorageBackend};
use memory::MemoryStore;
use spanner::SpannerClient;
use state::AppState;
use std::sync::Arc;
use store::Store;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("routes-api starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store: Arc<dyn Store> = match (config.backend, &config.spanner) {
        (StorageBackend::Spanner, Some(settings)) => Arc::new(SpannerClient::from_settings(settings).await?),
        (StorageBackend::Spanner, None) => anyhow::bail!("Spanner backend selected without Spanner settings"),
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let address = config.bind_address();
    let app = app::build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("routes-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
