//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through a per-request span
//! - Metrics are cheap (atomic increments) and no-ops without an exporter
//! - Tunnel endings are routine and never logged above debug

pub mod logging;
pub mod metrics;
