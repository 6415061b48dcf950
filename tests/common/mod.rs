//! Shared fixtures for router integration tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bigip_route_ctlr::config::BigIpConfig;
use bigip_route_ctlr::router::SinkError;
use bigip_route_ctlr::{Endpoint, OutputDocument, Router, Sink};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Sink that keeps the last written document in memory.
#[derive(Debug, Default)]
pub struct MockSink {
    input: Mutex<Option<Vec<u8>>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
}

impl MockSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of write calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn raw(&self) -> Option<Vec<u8>> {
        self.input.lock().unwrap().clone()
    }

    pub fn document(&self) -> Option<OutputDocument> {
        self.raw()
            .map(|bytes| serde_json::from_slice(&bytes).expect("sink holds valid JSON"))
    }
}

impl Sink for MockSink {
    fn output_filename(&self) -> &str {
        "mock-file"
    }

    fn write(&self, document: &[u8]) -> Result<usize, SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Rejected("mock failure".into()));
        }
        *self.input.lock().unwrap() = Some(document.to_vec());
        Ok(document.len())
    }
}

pub fn make_config() -> BigIpConfig {
    BigIpConfig {
        url: "http://example.com".into(),
        user: "admin".into(),
        pass: "pass".into(),
        partitions: vec!["cf".into()],
        external_addr: "127.0.0.1".into(),
        ..Default::default()
    }
}

pub fn make_endpoint(addr: &str) -> Endpoint {
    Endpoint::new(addr, 80).with_instance_id("1")
}

/// A router running on a spawned task.
pub struct RunningRouter {
    pub router: Arc<Router>,
    shutdown: broadcast::Sender<()>,
    handle: JoinHandle<Result<(), bigip_route_ctlr::RouterError>>,
}

impl RunningRouter {
    /// Spawn `router.run` and wait until it reports ready.
    pub async fn start(router: Router) -> Self {
        let router = Arc::new(router);
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let (ready_tx, ready_rx) = oneshot::channel();

        let task_router = router.clone();
        let handle = tokio::spawn(
            async move { task_router.run(shutdown_rx, ready_tx).await }.in_current_span(),
        );

        tokio::time::timeout(Duration::from_secs(5), ready_rx)
            .await
            .expect("timed out waiting for ready")
            .expect("router dropped ready");

        Self {
            router,
            shutdown,
            handle,
        }
    }

    /// Send the shutdown signal and wait for `run` to return.
    pub async fn stop(self) -> Result<(), bigip_route_ctlr::RouterError> {
        self.shutdown.send(()).expect("router is listening");
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("timed out waiting for run to complete")
            .expect("router task panicked")
    }
}

/// Poll `check` until it returns true or five seconds pass.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) -> bool {
    for _ in 0..500 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// URI → member addresses, as written in the last document's pools.
pub fn pool_members(doc: &OutputDocument) -> BTreeMap<String, Vec<String>> {
    doc.resources
        .pools
        .iter()
        .map(|p| {
            let mut members: Vec<String> = p
                .members
                .iter()
                .map(|m| format!("{}:{}", m.address, m.port))
                .collect();
            members.sort();
            (p.description.clone(), members)
        })
        .collect()
}

/// Rule descriptions (URIs) of the routing policy, in written order.
pub fn rule_uris(doc: &OutputDocument) -> Vec<String> {
    doc.resources
        .policies
        .iter()
        .flat_map(|p| p.rules.iter().map(|r| r.description.clone()))
        .collect()
}

/// Build the expected URI → members map from `(uri, [addr])` pairs.
pub fn expected(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(uri, addrs)| {
            let mut members: Vec<String> = addrs.iter().map(|a| format!("{}:80", a)).collect();
            members.sort();
            (uri.to_string(), members)
        })
        .collect()
}
