use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sluice_monitor::api;
use sluice_monitor::config::Config;
use sluice_monitor::service::ExecutionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_monitor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sluice Monitor...");

    let config = load_config()?;

    let store = Arc::new(ExecutionStore::new(config.observer_buffer));

    // Build router with all API endpoints
    let app = api::create_router(store);

    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("  control:     POST /api/start, /api/update, /api/step");
    tracing::info!("  observation: ws://{}/ws", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind_addr, e))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> anyhow::Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(_) => {
            tracing::info!("MONITOR_BIND_ADDR not set, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
