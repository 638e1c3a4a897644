//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Prometheus scrape endpoint (optional)
//!     → reporter.rs → GET /metrics/circuit-breakers (JSON snapshot)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request span
//! - Metrics are cheap and safe to record before a recorder is installed
//! - The breaker snapshot is a pure read and never triggers transitions

pub mod logging;
pub mod metrics;
pub mod reporter;

pub use reporter::{BreakerSnapshot, MetricsReporter};
