//! Shared utilities for end-to-end tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use recommendation_gateway::config::GatewayConfig;
use recommendation_gateway::downstream::Dependency;
use recommendation_gateway::stubs::{self, StubState};
use recommendation_gateway::{GatewayServer, Shutdown};
use tokio::net::TcpListener;

/// A gateway wired to three freshly started stubs.
pub struct Harness {
    pub gateway: SocketAddr,
    pub profile: Arc<StubState>,
    pub catalog: Arc<StubState>,
    pub trending: Arc<StubState>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl Harness {
    /// Start stubs and a gateway on ephemeral ports. `tune` adjusts the gateway
    /// config after the downstream URLs have been filled in.
    pub async fn start(tune: impl FnOnce(&mut GatewayConfig)) -> Self {
        let shutdown = Shutdown::new();
        let slow_delay = Duration::from_secs(2);

        let (profile_addr, profile) = start_stub(Dependency::UserProfile, slow_delay, &shutdown).await;
        let (catalog_addr, catalog) = start_stub(Dependency::ProductCatalog, slow_delay, &shutdown).await;
        let (trending_addr, trending) = start_stub(Dependency::Trending, slow_delay, &shutdown).await;

        let mut config = GatewayConfig::default();
        config.downstream.profile_url = format!("http://{}", profile_addr);
        config.downstream.catalog_url = format!("http://{}", catalog_addr);
        config.downstream.trending_url = format!("http://{}", trending_addr);
        config.breakers.profile.call_timeout_ms = 200;
        config.breakers.catalog.call_timeout_ms = 200;
        tune(&mut config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gateway = listener.local_addr().unwrap();
        let server = GatewayServer::new(config).unwrap();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();

        Self {
            gateway,
            profile,
            catalog,
            trending,
            client,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.gateway, path)
    }

    pub async fn get_json(&self, path: &str) -> (u16, serde_json::Value) {
        let res = self.client.get(self.url(path)).send().await.expect("gateway unreachable");
        let status = res.status().as_u16();
        (status, res.json().await.expect("JSON body"))
    }

    pub async fn post(&self, path: &str) -> u16 {
        self.client
            .post(self.url(path))
            .send()
            .await
            .expect("gateway unreachable")
            .status()
            .as_u16()
    }

    pub async fn breaker_state(&self, dependency: &str) -> String {
        let (_, body) = self.get_json("/metrics/circuit-breakers").await;
        body[dependency]["state"].as_str().unwrap_or_default().to_string()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

async fn start_stub(
    kind: Dependency,
    slow_delay: Duration,
    shutdown: &Shutdown,
) -> (SocketAddr, Arc<StubState>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(StubState::new(kind, slow_delay));

    let served = state.clone();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = stubs::serve(listener, served, rx).await;
    });

    (addr, state)
}
