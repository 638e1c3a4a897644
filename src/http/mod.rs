//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request id, request span)
//!     → handlers.rs (health, recommendations, simulate, breaker metrics)
//!     → error.rs (map failures to JSON error responses)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, GatewayServer};
