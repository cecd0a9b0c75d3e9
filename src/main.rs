//! Slack Thread-Reply Recorder - Main Entry Point
//!
//! Receives Slack Events API webhooks, verifies their signatures, and
//! records threaded replies against the stored message their thread points
//! back to.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slack_thread_recorder::config::AppConfig;
use slack_thread_recorder::storage::MessageStore;
use slack_thread_recorder::webhook::{self, WebhookState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,slack_thread_recorder=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Slack thread-reply recorder starting...");

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("📋 Configuration loaded");

    // Connect the store; this doubles as the startup database self-test
    let store = Arc::new(MessageStore::connect(&config.database_url).await?);
    info!("📦 Message store initialized");

    // Spawn webhook server
    let addr: SocketAddr = config.listen_addr.parse()?;
    let listen_addr = config.listen_addr.clone();
    let state = WebhookState::new(config, store);
    let server = tokio::spawn(async move {
        if let Err(e) = webhook::run_server(addr, state).await {
            tracing::error!("Webhook server error: {}", e);
        }
    });

    info!("🌐 Webhook server listening on {}", listen_addr);

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => info!("📢 Shutdown signal received"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }

    // Graceful shutdown
    info!("🛑 Shutting down server...");
    server.abort();

    info!("✅ Slack thread-reply recorder stopped");
    Ok(())
}
