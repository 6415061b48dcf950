//! The reconciliation loop.
//!
//! # Responsibilities
//! - Validate collaborators and static configuration at construction
//! - Subscribe to registry changes and signal readiness once
//! - Rebuild and write the full configuration on every (coalesced) change
//! - Stop cooperatively on shutdown
//!
//! # Design Decisions
//! - One worker: `run` is the only place builds happen, so builds never
//!   overlap and the sink never sees interleaved writes
//! - Each cycle reads a fresh snapshot; notifications only say "something
//!   changed", so lagged or coalesced notifications lose nothing
//! - Failures after startup are logged and counted, never returned

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, oneshot, watch};

use crate::config::schema::{BigIpConfig, GlobalConfig};
use crate::config::validation::validate_bigip;
use crate::observability::metrics;
use crate::registry::{Registry, RouteUpdate};
use crate::resources::{ConfigBuilder, OutputDocument, Resources};
use crate::router::sink::Sink;
use crate::router::types::{RouterError, RouterState};

const TRANSITION_CHANNEL_CAPACITY: usize = 16;

/// Builder for [`Router`]. Every collaborator is required.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    config: Option<BigIpConfig>,
    global: GlobalConfig,
    registry: Option<Arc<dyn Registry>>,
    sink: Option<Arc<dyn Sink>>,
    coalesce: Duration,
}

impl RouterBuilder {
    pub fn config(mut self, config: BigIpConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Driver settings echoed into every document.
    pub fn global(mut self, global: GlobalConfig) -> Self {
        self.global = global;
        self
    }

    pub fn registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Wait this long after the first change of a burst before building.
    pub fn coalesce(mut self, window: Duration) -> Self {
        self.coalesce = window;
        self
    }

    /// Validate and construct the router. Checks run in order and the first
    /// failure is returned.
    pub fn build(self) -> Result<Router, RouterError> {
        let config = self.config.ok_or(RouterError::MissingConfig)?;
        let sink = self.sink.ok_or(RouterError::MissingSink)?;
        let registry = self.registry.ok_or(RouterError::MissingRegistry)?;
        validate_bigip(&config)?;

        let builder = ConfigBuilder::new(&config);
        let (state, _) = watch::channel(RouterState::Idle);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        Ok(Router {
            config: Arc::new(config),
            global: self.global,
            registry,
            sink,
            builder,
            coalesce: self.coalesce,
            state,
            transitions,
            last: ArcSwapOption::empty(),
        })
    }
}

/// Keeps the sink's configuration in step with the registry.
#[derive(Debug)]
pub struct Router {
    config: Arc<BigIpConfig>,
    global: GlobalConfig,
    registry: Arc<dyn Registry>,
    sink: Arc<dyn Sink>,
    builder: ConfigBuilder,
    coalesce: Duration,
    state: watch::Sender<RouterState>,
    transitions: broadcast::Sender<RouterState>,
    last: ArcSwapOption<Resources>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RouterState {
        *self.state.borrow()
    }

    /// Watch the current lifecycle state. Intermediate states may be skipped
    /// by a slow reader.
    pub fn subscribe_state(&self) -> watch::Receiver<RouterState> {
        self.state.subscribe()
    }

    /// Receive every state entered after this call, in order.
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<RouterState> {
        self.transitions.subscribe()
    }

    /// The resources of the last successful write, if any.
    pub fn last_resources(&self) -> Option<Arc<Resources>> {
        self.last.load_full()
    }

    /// The builder this router reconciles with.
    pub fn config_builder(&self) -> &ConfigBuilder {
        &self.builder
    }

    /// Run until a value arrives on `shutdown` (or its sender goes away).
    ///
    /// `ready` fires once the registry subscription is in place; it does not
    /// mean a document has been written yet. Returns `Ok(())` on shutdown;
    /// only a router that is not idle refuses to run.
    pub async fn run(
        &self,
        mut shutdown: broadcast::Receiver<()>,
        ready: oneshot::Sender<()>,
    ) -> Result<(), RouterError> {
        let claimed = self.state.send_if_modified(|state| {
            if *state == RouterState::Idle {
                *state = RouterState::Starting;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(RouterError::AlreadyStarted(self.state()));
        }
        let _ = self.transitions.send(RouterState::Starting);

        let mut updates = self.registry.subscribe();
        self.transition(RouterState::Running);
        let _ = ready.send(());

        tracing::info!(
            partition = %self.builder.partition(),
            output = %self.sink.output_filename(),
            "Router running"
        );

        // Anything registered before the subscription is picked up here.
        self.reconcile().await;

        let mut updates_open = true;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                update = updates.recv(), if updates_open => match update {
                    Ok(update) => {
                        if !accept_update(&update) {
                            continue;
                        }
                        self.drain_pending(&mut updates).await;
                        self.reconcile().await;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "Registry updates lagged, rebuilding from snapshot");
                        metrics::record_coalesced(missed);
                        self.drain_pending(&mut updates).await;
                        self.reconcile().await;
                    }
                    Err(RecvError::Closed) => {
                        tracing::warn!("Registry update channel closed, waiting for shutdown");
                        updates_open = false;
                    }
                },
            }
        }

        self.transition(RouterState::Draining);
        tracing::info!("Router received shutdown signal");
        self.transition(RouterState::Stopped);
        Ok(())
    }

    /// Fold every notification already queued (after the optional coalescing
    /// window) into the cycle about to run.
    async fn drain_pending(&self, updates: &mut broadcast::Receiver<RouteUpdate>) {
        if !self.coalesce.is_zero() {
            tokio::time::sleep(self.coalesce).await;
        }

        let mut coalesced = 0u64;
        loop {
            match updates.try_recv() {
                Ok(update) => {
                    if accept_update(&update) {
                        coalesced += 1;
                    }
                }
                Err(TryRecvError::Lagged(missed)) => coalesced += missed,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if coalesced > 0 {
            tracing::debug!(coalesced, "Coalesced registry updates");
            metrics::record_coalesced(coalesced);
        }
    }

    /// Build from a fresh snapshot and hand the document to the sink.
    async fn reconcile(&self) {
        let start = Instant::now();
        let snapshot = self.registry.snapshot();
        let resources = self.builder.build(&snapshot);
        metrics::record_resources(resources.pools.len(), resources.rule_count());

        let document = OutputDocument {
            global: self.global.clone(),
            bigip: (*self.config).clone(),
            resources,
        };
        let bytes = match serde_json::to_vec(&document) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize configuration");
                metrics::record_reconcile("serialize_error", start);
                return;
            }
        };

        let sink = self.sink.clone();
        match tokio::task::spawn_blocking(move || sink.write(&bytes)).await {
            Ok(Ok(written)) => {
                tracing::debug!(
                    output = %self.sink.output_filename(),
                    bytes = written,
                    pools = document.resources.pools.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Configuration written"
                );
                self.last.store(Some(Arc::new(document.resources)));
                metrics::record_reconcile("written", start);
            }
            Ok(Err(e)) => {
                tracing::error!(
                    output = %self.sink.output_filename(),
                    error = %e,
                    "Failed to write configuration"
                );
                metrics::record_reconcile("write_error", start);
            }
            Err(e) => {
                tracing::error!(error = %e, "Configuration write task failed");
                metrics::record_reconcile("write_error", start);
            }
        }
    }

    fn transition(&self, next: RouterState) {
        let previous = self.state.send_replace(next);
        let _ = self.transitions.send(next);
        tracing::debug!(from = %previous, to = %next, "Router state changed");
    }
}

/// Drop notifications that cannot describe a route.
fn accept_update(update: &RouteUpdate) -> bool {
    if update.uri.is_empty() {
        tracing::warn!(
            event = "skipping-update",
            endpoint = %update.endpoint.canonical_addr(),
            action = ?update.action,
            "Skipping route update without a URI"
        );
        metrics::record_skipped("empty-uri");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Endpoint, MemoryRegistry, Uri};
    use crate::router::sink::SinkError;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingSink {
        writes: Mutex<Vec<Vec<u8>>>,
    }

    impl Sink for RecordingSink {
        fn output_filename(&self) -> &str {
            "recording"
        }

        fn write(&self, document: &[u8]) -> Result<usize, SinkError> {
            self.writes.lock().unwrap().push(document.to_vec());
            Ok(document.len())
        }
    }

    fn config() -> BigIpConfig {
        BigIpConfig {
            url: "http://example.com".into(),
            user: "admin".into(),
            pass: "pass".into(),
            partitions: vec!["cf".into()],
            external_addr: "127.0.0.1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let registry: Arc<dyn Registry> = Arc::new(MemoryRegistry::new());
        let sink: Arc<dyn Sink> = Arc::new(RecordingSink::default());

        let err = Router::builder()
            .registry(registry.clone())
            .sink(sink.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, RouterError::MissingConfig));

        let err = Router::builder()
            .config(config())
            .registry(registry.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, RouterError::MissingSink));

        let err = Router::builder()
            .config(config())
            .sink(sink.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, RouterError::MissingRegistry));

        let router = Router::builder()
            .config(config())
            .registry(registry)
            .sink(sink)
            .build()
            .unwrap();
        assert_eq!(router.state(), RouterState::Idle);
    }

    #[test]
    fn test_accept_update() {
        let ok = RouteUpdate {
            action: crate::registry::RouteAction::Register,
            uri: Uri::new("foo.cf.com"),
            endpoint: Endpoint::new("127.0.0.1", 80),
        };
        assert!(accept_update(&ok));

        let empty = RouteUpdate {
            uri: Uri::new(""),
            ..ok
        };
        assert!(!accept_update(&empty));
    }

    #[tokio::test]
    async fn test_initial_write_and_drain() {
        let registry = Arc::new(MemoryRegistry::new());
        registry.register(&Uri::new("foo.cf.com"), Endpoint::new("127.0.0.1", 80));
        let sink = Arc::new(RecordingSink::default());

        let router = Router::builder()
            .config(config())
            .registry(registry.clone())
            .sink(sink.clone())
            .build()
            .unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (ready_tx, ready_rx) = oneshot::channel();
        shutdown_tx.send(()).unwrap();

        // Shutdown is already pending; run still performs the initial cycle.
        router.run(shutdown_rx, ready_tx).await.unwrap();

        assert!(ready_rx.await.is_ok());
        assert_eq!(router.state(), RouterState::Stopped);
        assert_eq!(sink.writes.lock().unwrap().len(), 1);
        assert_eq!(router.last_resources().unwrap().pools.len(), 1);
    }

    #[tokio::test]
    async fn test_drain_pending_folds_queued_updates() {
        let registry = Arc::new(MemoryRegistry::new());
        let router = Router::builder()
            .config(config())
            .registry(registry.clone())
            .sink(Arc::new(RecordingSink::default()))
            .build()
            .unwrap();

        let mut updates = registry.subscribe();
        for i in 0..5u16 {
            registry.register(&Uri::new("foo.cf.com"), Endpoint::new("127.0.0.1", 8000 + i));
        }

        router.drain_pending(&mut updates).await;
        assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
    }
}
