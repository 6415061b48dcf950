//! Output configuration subsystem.
//!
//! # Data Flow
//! ```text
//! BigIpConfig (at router construction)
//!     → reference.rs (parse monitor/profile/policy references, skip bad ones)
//!     → builder.rs (ConfigBuilder holds the parsed references)
//!
//! Each reconciliation cycle:
//!     registry snapshot
//!     → builder.rs (one pool + one rule per URI, virtuals, monitors)
//!     → ordering.rs (stable sort of rules by full URI)
//!     → Resources (immutable value, serialized into an OutputDocument)
//! ```
//!
//! # Design Decisions
//! - Rebuilt from scratch every cycle; nothing carried between cycles
//! - Top-level lists are sets for comparison purposes; only policy rules
//!   carry a meaningful order

pub mod builder;
pub mod ordering;
pub mod reference;
pub mod types;

pub use builder::ConfigBuilder;
pub use types::{
    Action, Condition, Member, Monitor, NameRef, OutputDocument, Policy, Pool, ProfileContext,
    ProfileRef, Resources, Rule, Virtual,
};
