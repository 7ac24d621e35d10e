//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http server, db handle, identity provider
//!     → logging.rs (tracing events with request_id / route / sql fields)
//!     → metrics.rs (site_* counters and latency histogram)
//!
//! Sinks:
//!     → stdout (fmt layer, filtered by RUST_LOG or observability.log_level)
//!     → Prometheus scrape listener (observability.metrics_address)
//! ```
//!
//! # Design Decisions
//! - Recording metrics without an installed exporter is a no-op
//! - Route labels use `Route::name()`, never the raw path

pub mod logging;
pub mod metrics;
