//! BIG-IP route controller library.
//!
//! Translates live route registrations into virtual servers, pools, monitors
//! and L7 routing policies, and hands each complete configuration to a sink.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resources;
pub mod router;

pub use config::schema::{BigIpConfig, ControllerConfig};
pub use lifecycle::Shutdown;
pub use registry::{Endpoint, MemoryRegistry, Registry, Uri};
pub use resources::{OutputDocument, Resources};
pub use router::{FileSink, Router, RouterError, RouterState, Sink};
