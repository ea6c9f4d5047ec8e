//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout log stream
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (client, filename, reason) instead of formatted strings
//! - Request ID flows from the request-id layer into trace spans
//! - Metrics are recorded unconditionally; without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
