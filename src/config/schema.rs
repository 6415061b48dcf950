//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the controller.
//! All types derive Serde traits for deserialization from config files; the
//! `bigip` and `global` sections are also echoed into every output document.

use serde::{Deserialize, Serialize};

/// Root configuration for the router controller.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ControllerConfig {
    /// Load-balancing device settings and operator references.
    pub bigip: BigIpConfig,

    /// Settings echoed to the configuration driver.
    pub global: GlobalConfig,

    /// Where serialized configuration documents are written.
    pub output: OutputConfig,

    /// Reconciliation loop tuning.
    pub routing: RoutingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Statically seeded routes fed into the in-memory registry.
    pub routes: Vec<RouteConfig>,
}

/// Device section of the static configuration.
///
/// Immutable once a router has been built from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BigIpConfig {
    /// Management URL of the device (e.g., "https://10.0.0.1").
    pub url: String,

    /// Management username.
    pub user: String,

    /// Management password.
    pub pass: String,

    /// Partitions managed by the controller. The first one holds the
    /// routing virtuals, pools and policy.
    pub partitions: Vec<String>,

    /// Address the routing virtual servers listen on.
    pub external_addr: String,

    /// Pool load-balancing mode.
    pub balance: String,

    /// Health monitor references (`partition/name`).
    pub health_monitors: Vec<String>,

    /// Client SSL profile references (`partition/name`).
    pub ssl_profiles: Vec<String>,

    /// Profile references attached to every routing virtual.
    pub profiles: Vec<String>,

    /// L7 policy references attached ahead of the routing policy.
    pub policies: Vec<String>,
}

impl Default for BigIpConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: String::new(),
            pass: String::new(),
            partitions: Vec::new(),
            external_addr: String::new(),
            balance: "round-robin".to_string(),
            health_monitors: Vec::new(),
            ssl_profiles: Vec::new(),
            profiles: Vec::new(),
            policies: Vec::new(),
        }
    }
}

/// Global settings for the configuration driver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Driver log level.
    #[serde(rename = "log-level", alias = "log_level")]
    pub log_level: String,

    /// Seconds between driver verification passes.
    #[serde(rename = "verify-interval", alias = "verify_interval")]
    pub verify_interval: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            verify_interval: 30,
        }
    }
}

/// Output destination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the file the serialized configuration is written to.
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "/tmp/bigip-route-ctlr.json".to_string(),
        }
    }
}

/// Reconciliation loop configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Delay in milliseconds before draining a burst of registry updates.
    /// Zero builds as soon as the first update of a burst arrives.
    pub coalesce_ms: u64,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A statically seeded route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route URI (host with optional path, `*.` wildcards allowed).
    pub uri: String,

    /// Backend endpoints serving the URI.
    pub endpoints: Vec<EndpointConfig>,
}

/// A statically seeded backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Backend IP address.
    pub address: String,

    /// Backend port.
    pub port: u16,

    /// Instance identity; defaults to the canonical address.
    #[serde(default)]
    pub instance_id: Option<String>,
}
