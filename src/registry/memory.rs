//! In-memory route registry.
//!
//! # Responsibilities
//! - Track URI → endpoint membership keyed by canonical address
//! - Serve consistent point-in-time snapshots
//! - Publish a change notification after every effective mutation
//! - Refuse registrations without a URI
//!
//! # Design Decisions
//! - A single RwLock over the whole table: snapshots must not observe a
//!   half-applied burst of mutations from another shard
//! - Bounded broadcast; lagging subscribers rebuild from a snapshot

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use crate::observability::metrics;
use crate::registry::route::{Endpoint, PoolView, RouteAction, RouteEntry, RouteUpdate, Uri};
use crate::registry::Registry;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Endpoints per URI, keyed by canonical address.
type RouteTable = HashMap<Uri, BTreeMap<String, Endpoint>>;

/// Thread-safe in-memory registry.
#[derive(Debug)]
pub struct MemoryRegistry {
    routes: RwLock<RouteTable>,
    updates: broadcast::Sender<RouteUpdate>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            routes: RwLock::new(HashMap::new()),
            updates,
        }
    }

    /// Number of URIs currently registered.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, RouteTable> {
        self.routes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RouteTable> {
        self.routes.write().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, action: RouteAction, uri: &Uri, endpoint: Endpoint) {
        // No subscribers yet is fine; they start from a snapshot.
        let _ = self.updates.send(RouteUpdate {
            action,
            uri: uri.clone(),
            endpoint,
        });
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for MemoryRegistry {
    fn register(&self, uri: &Uri, endpoint: Endpoint) {
        if uri.is_empty() {
            tracing::warn!(
                event = "skipping-update",
                endpoint = %endpoint.canonical_addr(),
                "Skipping registration without a URI"
            );
            metrics::record_skipped("empty-uri");
            return;
        }

        let changed = {
            let mut routes = self.write();
            let members = routes.entry(uri.clone()).or_default();
            let previous = members.insert(endpoint.canonical_addr(), endpoint.clone());
            previous.as_ref() != Some(&endpoint)
        };

        if changed {
            tracing::debug!(uri = %uri, endpoint = %endpoint.canonical_addr(), "Route registered");
            self.publish(RouteAction::Register, uri, endpoint);
        }
    }

    fn unregister(&self, uri: &Uri, endpoint: &Endpoint) {
        let removed = {
            let mut routes = self.write();
            match routes.get_mut(uri) {
                Some(members) => {
                    let removed = members.remove(&endpoint.canonical_addr()).is_some();
                    if members.is_empty() {
                        routes.remove(uri);
                    }
                    removed
                }
                None => false,
            }
        };

        if removed {
            tracing::debug!(uri = %uri, endpoint = %endpoint.canonical_addr(), "Route unregistered");
            self.publish(RouteAction::Unregister, uri, endpoint.clone());
        }
    }

    fn lookup_without_wildcard(&self, uri: &Uri) -> Option<PoolView> {
        self.read()
            .get(uri)
            .filter(|members| !members.is_empty())
            .map(|members| PoolView::new(members.values().cloned().collect()))
    }

    fn snapshot(&self) -> Vec<RouteEntry> {
        let routes = self.read();
        let mut entries: Vec<RouteEntry> = routes
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(uri, members)| RouteEntry {
                uri: uri.clone(),
                endpoints: members.values().cloned().collect(),
            })
            .collect();
        drop(routes);

        entries.sort_by(|a, b| a.uri.cmp(&b.uri));
        entries
    }

    fn subscribe(&self) -> broadcast::Receiver<RouteUpdate> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_register_empty_uri_is_dropped() {
        let registry = MemoryRegistry::new();
        let mut rx = registry.subscribe();

        registry.register(&Uri::new(""), Endpoint::new("127.0.0.1", 80));

        assert!(registry.is_empty());
        assert!(registry.lookup_without_wildcard(&Uri::new("")).is_none());
        assert!(registry.snapshot().is_empty());
        assert!(rx.try_recv().is_err());
        assert!(logs_contain("skipping-update"));
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = MemoryRegistry::new();
        let mut rx = registry.subscribe();
        let uri = Uri::new("foo.cf.com");

        registry.register(&uri, Endpoint::new("127.0.0.1", 80));
        registry.register(&uri, Endpoint::new("127.0.0.1", 80));

        let pool = registry.lookup_without_wildcard(&uri).unwrap();
        assert_eq!(pool.len(), 1);

        // Only the effective mutation is published.
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unregister_last_endpoint_removes_uri() {
        let registry = MemoryRegistry::new();
        let uri = Uri::new("foo.cf.com");
        let ep = Endpoint::new("127.0.0.1", 80);

        registry.register(&uri, ep.clone());
        registry.unregister(&uri, &ep);

        assert!(registry.lookup_without_wildcard(&uri).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_unknown_is_silent() {
        let registry = MemoryRegistry::new();
        let mut rx = registry.subscribe();

        registry.unregister(&Uri::new("nope.cf.com"), &Endpoint::new("127.0.0.1", 80));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_lookup_without_wildcard_is_exact() {
        let registry = MemoryRegistry::new();
        registry.register(&Uri::new("*.cf.com"), Endpoint::new("127.0.5.1", 80));

        assert!(registry.lookup_without_wildcard(&Uri::new("foo.cf.com")).is_none());
        assert!(registry.lookup_without_wildcard(&Uri::new("*.cf.com")).is_some());
    }

    #[test]
    fn test_snapshot_sorted_by_uri() {
        let registry = MemoryRegistry::new();
        for uri in ["foo.cf.com", "bar.cf.com", "baz.cf.com/segment1", "*.cf.com"] {
            registry.register(&Uri::new(uri), Endpoint::new("127.0.0.1", 80));
        }

        let uris: Vec<String> = registry
            .snapshot()
            .into_iter()
            .map(|e| e.uri.to_string())
            .collect();
        assert_eq!(
            uris,
            vec!["*.cf.com", "bar.cf.com", "baz.cf.com/segment1", "foo.cf.com"]
        );
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(MemoryRegistry::new());
        let handles: Vec<_> = (0..8u16)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for port in 0..50u16 {
                        registry.register(
                            &Uri::new("bar.cf.com"),
                            Endpoint::new(format!("127.0.1.{}", i), 8000 + port),
                        );
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let pool = registry
            .lookup_without_wildcard(&Uri::new("bar.cf.com"))
            .unwrap();
        assert_eq!(pool.len(), 400);
    }
}
