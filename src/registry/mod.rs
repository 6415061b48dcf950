//! Route registry subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration traffic / static seeds (seed.rs)
//!     → Registry::register / unregister (concurrent callers)
//!     → RouteUpdate broadcast to subscribers
//!     → Router drains updates, takes a snapshot, rebuilds
//! ```
//!
//! # Design Decisions
//! - The router only depends on the `Registry` trait; storage and wildcard
//!   matching stay behind it
//! - Notifications carry the mutated URI for diagnostics, but builds always
//!   read a fresh snapshot, so a lost or lagged notification never loses state
//! - Snapshots are sorted by URI

pub mod memory;
pub mod route;
pub mod seed;

use tokio::sync::broadcast;

pub use memory::MemoryRegistry;
pub use route::{Endpoint, PoolView, RouteAction, RouteEntry, RouteUpdate, Uri};

/// Source of live URI → endpoint mappings.
pub trait Registry: Send + Sync + std::fmt::Debug {
    /// Add `endpoint` to the pool serving `uri`. Re-registering an endpoint
    /// with the same canonical address does not duplicate it.
    fn register(&self, uri: &Uri, endpoint: Endpoint);

    /// Remove `endpoint` from the pool serving `uri`; the URI disappears with
    /// its last endpoint.
    fn unregister(&self, uri: &Uri, endpoint: &Endpoint);

    /// Exact lookup of a URI, without wildcard resolution.
    fn lookup_without_wildcard(&self, uri: &Uri) -> Option<PoolView>;

    /// Consistent point-in-time view of every URI with at least one endpoint,
    /// sorted by URI.
    fn snapshot(&self) -> Vec<RouteEntry>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<RouteUpdate>;
}
