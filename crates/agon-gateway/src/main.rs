//! Agon Gateway - Real-time fan-out server for the Agon arena.
//!
//! This is the main entry point for running a gateway node.

use agon_chat::ChatOverlay;
use agon_gateway::bridge::RealtimeBridge;
use agon_gateway::config::GatewayConfig;
use agon_gateway::logging::{init_logging, LogFormat};
use agon_gateway::server::Gateway;
use agon_realtime::{EventDispatcher, SubscriptionRegistry};
use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Agon Gateway - real-time event fan-out for on-chain agent games
#[derive(Parser, Debug)]
#[command(name = "agon-gateway")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address for the HTTP/WebSocket API
    #[arg(long)]
    listen_addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (pretty, json)
    #[arg(long, default_value = "pretty")]
    log_format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(
        &args.log_level,
        LogFormat::parse(&args.log_format) == LogFormat::Json,
    );

    let mut config = match &args.config {
        Some(path) => GatewayConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    if let Some(listen_addr) = args.listen_addr {
        config.listen_addr = listen_addr;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Agon gateway");
    info!(
        listen_addr = %config.listen_addr,
        max_connections = config.max_connections,
        max_rooms_per_connection = config.max_rooms_per_connection,
        "Gateway configuration"
    );

    let registry = Arc::new(SubscriptionRegistry::with_room_limit(
        config.max_rooms_per_connection,
    ));
    let dispatcher = Arc::new(EventDispatcher::new());
    let chat = Arc::new(ChatOverlay::with_config(
        registry.clone(),
        dispatcher.clone(),
        config.chat.clone(),
    ));
    let bridge = RealtimeBridge::new(registry, dispatcher, chat, &config);
    bridge.wire();

    let gateway = Gateway::serve(&config, bridge).await?;
    info!(addr = %gateway.local_addr(), "Gateway is ready. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown signal received");

    let report = gateway.shutdown().await;
    if report.is_clean() {
        info!(closed = report.closed, "Shutdown complete");
    } else {
        warn!(
            closed = report.closed,
            failed = report.failures.len(),
            "Shutdown complete with close failures"
        );
    }

    Ok(())
}
