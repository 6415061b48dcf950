//! Reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! Router::builder()
//!     → config + registry + sink checks, validate_bigip (fail fast)
//!     → Router (Idle)
//!
//! Router::run(shutdown, ready):
//!     Idle → Starting → subscribe to registry → Running (ready fired)
//!     Running: wait on { registry update, shutdown }
//!         update → drain queued updates → snapshot → build → sink.write
//!     shutdown → Draining → Stopped → Ok(())
//! ```
//!
//! # Design Decisions
//! - Single worker, one complete write per cycle
//! - Shutdown is observed only at the wait point, never mid-cycle
//! - Write failures keep the previous document in place and the loop alive

pub mod reconciler;
pub mod sink;
pub mod types;

pub use reconciler::{Router, RouterBuilder};
pub use sink::{FileSink, Sink, SinkError};
pub use types::{RouterError, RouterState};
