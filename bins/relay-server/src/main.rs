use std::sync::Arc;

use anyhow::Context;
use relay_core::RelayConfig;
use relay_providers::OpenRouterClient;
use relay_web::{create_router, ServerState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,relay_web=debug,relay_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Device relay starting...");

    let config = RelayConfig::from_env().context("bad configuration")?;

    if !config.images_dir.exists() {
        std::fs::create_dir_all(&config.images_dir).with_context(|| {
            format!("failed to create {}", config.images_dir.display())
        })?;
        tracing::info!("Created missing directory: {}", config.images_dir.display());
    }

    if config.text_key.is_empty() {
        tracing::warn!("No text API key configured; /gpt/ask will fail until one is set");
    }

    let completions = Arc::new(OpenRouterClient::from_config(&config.models));
    let state = Arc::new(ServerState::new(&config, completions));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("   Device poll:  /esp32/poll");
    tracing::info!("   Operator UI:  {}", config.public_dir.display());
    tracing::info!(
        "   Models:       text={} vision={}",
        config.models.text_model,
        config.models.vision_model
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down..."),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
