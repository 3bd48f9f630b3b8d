//! Swap service entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use swap_service::app::{claim_cipher, SwapService};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::SystemClock;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay under config/environments
    #[arg(short, long)]
    environment: Option<String>,

    /// Bind address
    #[arg(long)]
    bind_address: Option<String>,

    /// Port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = config::load_config(args.config.as_deref(), args.environment.as_deref())
        .context("Failed to load configuration")?;
    if let Some(bind_address) = args.bind_address {
        config.server.bind_address = bind_address;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging.level, &config.logging.format);

    info!("Starting Orchard swap service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    let service = SwapService::in_memory(&config, claim_cipher(&config)?, Arc::new(SystemClock))?;
    let routes = swap_service::api::routes(service.api_state());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(async move { service.worker.run(shutdown_rx).await });

    let mut server_shutdown = shutdown_tx.subscribe();
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async move {
            let _ = server_shutdown.changed().await;
        })
        .context("Failed to bind HTTP server")?;
    info!("Listening on {}", bound);
    let server = tokio::spawn(server);

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
    let _ = shutdown_tx.send(true);

    if let Err(e) = server.await {
        error!("HTTP server task failed: {}", e);
    }
    if let Err(e) = worker.await {
        error!("Settlement worker task failed: {}", e);
    }

    info!("Orchard swap service stopped");
    Ok(())
}

fn init_tracing(level: &str, format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},warp=warn", level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
