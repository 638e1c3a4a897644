//! Downstream collaborators subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator
//!     → RecommendationSources (client.rs trait seam)
//!     → DownstreamClient (reqwest, JSON)
//!     → profile / catalog / trending collaborators
//! ```
//!
//! # Design Decisions
//! - Wire types live in types.rs and are shared with the in-crate stubs
//! - The client never retries; resilience is the breaker's job

pub mod client;
pub mod types;

pub use client::{DownstreamClient, RecommendationSources};
pub use types::{
    Behavior, Catalog, Dependency, DownstreamError, Product, TrendingList, UnknownName,
    UserProfile,
};
