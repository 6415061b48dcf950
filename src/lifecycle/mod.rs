//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build router → Run loop (ready) → Seed routes → Watch file
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Router drains current cycle → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then router, then route sources
//! - Shutdown is cooperative; no cycle is interrupted halfway

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
