//! Recommendation gateway library.
//!
//! Composes user-profile and product-catalog data into recommendations,
//! protecting each dependency with its own circuit breaker and degrading to a
//! trending list when dependencies are unavailable.

pub mod config;
pub mod downstream;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod resilience;
pub mod stubs;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use orchestrator::{Orchestrator, Recommendations};
pub use resilience::{CircuitBreaker, CircuitState};
