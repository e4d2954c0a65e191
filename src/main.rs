//! skv - A Small In-Memory Key-Value Server
//!
//! This is the main entry point for the skv server.
//! It reads configuration, sets up logging, starts the server and stops it
//! gracefully on Ctrl+C or SIGTERM.

use anyhow::Context;
use clap::Parser;
use skv::config::{Config, LogFormat};
use skv::server::Server;
use skv::storage::{Store, StoreBackend};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    let store = Arc::new(Store::new());
    let backend = Arc::new(StoreBackend::new(store));

    let server = Server::bind(backend, config.server())
        .await
        .context("starting server")?;
    let server = Arc::new(server);

    info!(
        server_id = %server.id(),
        addr = %server.local_addr(),
        version = skv::VERSION,
        "Starting skv server"
    );

    let listening = Arc::clone(&server);
    let accept_loop = tokio::spawn(async move { listening.listen().await });

    wait_for_stop_signal().await?;
    info!("Shutdown signal received, stopping server...");

    server.stop().await;
    accept_loop.await.context("accept loop panicked")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn wait_for_stop_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("installing SIGTERM handler")?;

        tokio::select! {
            res = signal::ctrl_c() => res.context("installing Ctrl+C handler")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c()
        .await
        .context("installing Ctrl+C handler")?;

    Ok(())
}
