//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (fail-fast device checks)
//!     → ControllerConfig (validated)
//!     → BigIpConfig shared via Arc with the router (immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → route seeds forwarded to the registry seeder
//! ```
//!
//! # Design Decisions
//! - The device section is immutable once a router is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::BigIpConfig;
pub use schema::ControllerConfig;
pub use schema::EndpointConfig;
pub use schema::GlobalConfig;
pub use schema::RouteConfig;
