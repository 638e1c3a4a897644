//! Recommendation gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │              RECOMMENDATION GATEWAY           │
//!   GET /recommendations │  ┌────────┐   ┌──────────────┐                │
//!  ──────────────────────┼─▶│  http  │──▶│ orchestrator │                │
//!                        │  └────────┘   └──────┬───────┘                │
//!                        │                      │                        │
//!                        │        ┌─────────────┼──────────────┐         │
//!                        │        ▼             ▼              ▼         │
//!                        │  ┌──────────┐  ┌──────────┐   (unprotected)   │
//!                        │  │ breaker  │  │ breaker  │         │         │
//!                        │  │ profile  │  │ catalog  │         │         │
//!                        │  └────┬─────┘  └────┬─────┘         │         │
//!                        └───────┼─────────────┼───────────────┼─────────┘
//!                                ▼             ▼               ▼
//!                          user-profile  product-catalog    trending
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use recommendation_gateway::config::load_config;
use recommendation_gateway::lifecycle::{signals, Shutdown};
use recommendation_gateway::observability::{logging, metrics};
use recommendation_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "recommendation-gateway")]
#[command(about = "Recommendation gateway with per-dependency circuit breakers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("recommendation-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        profile_call_timeout_ms = config.breakers.profile.call_timeout_ms,
        catalog_call_timeout_ms = config.breakers.catalog.call_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_termination(shutdown.clone()));

    let server = GatewayServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
