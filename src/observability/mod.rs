//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Dropped inputs are warnings tagged with an `event` field
//!   (`skipping-update`, `skipping-name`) so they can be filtered on
//! - Metrics are cheap and optional

pub mod logging;
pub mod metrics;
