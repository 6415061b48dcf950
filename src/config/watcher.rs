//! Configuration file watcher for static route reload.
//!
//! Only the `[[routes]]` seeds are picked up on change. The device section is
//! immutable for the lifetime of a router, so edits to it are reported and
//! otherwise ignored until restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{BigIpConfig, RouteConfig};

/// Watches the configuration file and publishes its route seeds on change.
pub struct RouteFileWatcher {
    path: PathBuf,
    active_bigip: BigIpConfig,
    update_tx: mpsc::UnboundedSender<Vec<RouteConfig>>,
}

impl RouteFileWatcher {
    /// Create a new watcher for `path`.
    ///
    /// `active_bigip` is the device section the running router was built with;
    /// reloads that change it are logged.
    pub fn new(
        path: &Path,
        active_bigip: BigIpConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Vec<RouteConfig>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                active_bigip,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for notifications to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            active_bigip,
            update_tx,
        } = self;
        let watch_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(config) => {
                            if config.bigip != active_bigip {
                                tracing::warn!(
                                    path = %path.display(),
                                    "bigip section changed on disk; restart to apply it"
                                );
                            }
                            tracing::info!(
                                routes = config.routes.len(),
                                "Route seeds reloaded"
                            );
                            let _ = update_tx.send(config.routes);
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "Failed to reload config, keeping current route seeds"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %watch_path.display(), "Config watcher started");
        Ok(watcher)
    }
}
