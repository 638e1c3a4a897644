//! Fixed-response downstream collaborator for local runs.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::net::TcpListener;

use recommendation_gateway::config::ObservabilityConfig;
use recommendation_gateway::downstream::Dependency;
use recommendation_gateway::lifecycle::{signals, Shutdown};
use recommendation_gateway::observability::logging;
use recommendation_gateway::stubs::{self, StubState};

/// Collaborator kinds, by wire name or short alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    #[value(alias = "profile")]
    UserProfile,
    #[value(alias = "catalog")]
    ProductCatalog,
    Trending,
}

impl From<Kind> for Dependency {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::UserProfile => Dependency::UserProfile,
            Kind::ProductCatalog => Dependency::ProductCatalog,
            Kind::Trending => Dependency::Trending,
        }
    }
}

#[derive(Parser)]
#[command(name = "stub-service")]
#[command(about = "Downstream stub: user-profile, product-catalog, or trending", long_about = None)]
struct Cli {
    /// Which collaborator to serve.
    #[arg(short, long, value_enum)]
    kind: Kind,

    #[arg(short, long, default_value = "127.0.0.1:8001")]
    bind: String,

    /// Delay applied to reads while the `slow` behavior is active.
    #[arg(long, default_value_t = 5_000)]
    slow_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(&ObservabilityConfig::default());

    let listener = TcpListener::bind(&cli.bind).await?;
    let state = Arc::new(StubState::new(cli.kind.into(), Duration::from_millis(cli.slow_delay_ms)));

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_termination(shutdown.clone()));

    stubs::serve(listener, state, shutdown.subscribe()).await?;
    Ok(())
}
