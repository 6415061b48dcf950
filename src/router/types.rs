//! Router state and error definitions.

use std::fmt;

use thiserror::Error;

use crate::config::validation::ValidationError;

/// Lifecycle state of a [`Router`](crate::router::Router).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// Constructed, `run` not yet invoked.
    Idle,
    /// `run` invoked, subscribing to the registry.
    Starting,
    /// Ready signalled, reconciling on every registry change.
    Running,
    /// Shutdown observed, finishing up.
    Draining,
    /// `run` has returned.
    Stopped,
}

impl fmt::Display for RouterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouterState::Idle => "idle",
            RouterState::Starting => "starting",
            RouterState::Running => "running",
            RouterState::Draining => "draining",
            RouterState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by router construction and startup.
///
/// Nothing that happens after the loop is running is reported here; those
/// failures are logged and the loop carries on.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("router requires a static configuration")]
    MissingConfig,

    #[error("router requires a sink")]
    MissingSink,

    #[error("router requires a registry")]
    MissingRegistry,

    #[error("invalid static configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("router cannot run from state {0}")]
    AlreadyStarted(RouterState),
}
