//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry, sink and router from a loaded configuration
//! - Seed static routes and keep them in sync with the config file
//! - Run until a termination signal, then stop every task
//!
//! # Design Decisions
//! - Fail fast: any construction error is fatal
//! - The router is ready before route seeds start changing

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::config::loader::ConfigError;
use crate::config::schema::{ControllerConfig, RouteConfig};
use crate::config::watcher::RouteFileWatcher;
use crate::lifecycle::signals::wait_for_signal;
use crate::lifecycle::Shutdown;
use crate::registry::seed::apply_route_seeds;
use crate::registry::{MemoryRegistry, Registry};
use crate::router::{FileSink, Router, RouterError};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("router error: {0}")]
    Router(#[from] RouterError),

    #[error("config watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("router stopped before it became ready")]
    NotReady,

    #[error("router task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Run the controller until SIGINT/SIGTERM.
///
/// `config_path`, when given, is watched for route seed changes.
pub async fn run_controller(
    config: ControllerConfig,
    config_path: Option<PathBuf>,
) -> Result<(), StartupError> {
    let registry = Arc::new(MemoryRegistry::new());
    let sink = Arc::new(FileSink::new(&config.output.path));

    let router = Arc::new(
        Router::builder()
            .config(config.bigip.clone())
            .global(config.global.clone())
            .registry(registry.clone())
            .sink(sink)
            .coalesce(Duration::from_millis(config.routing.coalesce_ms))
            .build()?,
    );

    let shutdown = Shutdown::new();
    let (ready_tx, ready_rx) = oneshot::channel();
    let router_task = {
        let router = router.clone();
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move { router.run(shutdown_rx, ready_tx).await })
    };
    ready_rx.await.map_err(|_| StartupError::NotReady)?;

    apply_route_seeds(&*registry, &[], &config.routes);

    let _watcher = match config_path {
        Some(path) => {
            let (watcher, seed_rx) = RouteFileWatcher::new(&path, config.bigip.clone());
            let watcher = watcher.run()?;
            tokio::spawn(apply_seed_updates(
                registry.clone(),
                config.routes.clone(),
                seed_rx,
                shutdown.subscribe(),
            ));
            Some(watcher)
        }
        None => None,
    };

    wait_for_signal().await;
    tracing::info!("Shutting down");
    shutdown.trigger();

    router_task.await??;
    tracing::info!(state = %router.state(), "Controller stopped");
    Ok(())
}

/// Apply reloaded route seeds until shutdown.
async fn apply_seed_updates(
    registry: Arc<dyn Registry>,
    mut current: Vec<RouteConfig>,
    mut seed_rx: mpsc::UnboundedReceiver<Vec<RouteConfig>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            next = seed_rx.recv() => match next {
                Some(next) => {
                    apply_route_seeds(&*registry, &current, &next);
                    current = next;
                }
                None => break,
            },
        }
    }
}
