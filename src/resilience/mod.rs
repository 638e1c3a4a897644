//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Protected call to a dependency:
//!     → circuit_breaker.rs (fail fast while open)
//!     → deadline race against the call timeout
//!     → outcome recorded, thresholds evaluated, state updated
//! ```
//!
//! # Design Decisions
//! - Every protected call has a deadline
//! - No retries: a failed call is recorded once and the caller falls back
//! - One breaker per dependency, owned for the process lifetime

pub mod circuit_breaker;

pub use circuit_breaker::{BreakerError, BreakerStats, CircuitBreaker, CircuitState};
