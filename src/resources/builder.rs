//! Configuration building.
//!
//! # Responsibilities
//! - Turn a registry snapshot into pools, rules and the routing policy
//! - Attach operator profiles and policies to the routing virtuals
//! - Emit monitors from the operator monitor references
//!
//! # Design Decisions
//! - Operator references are parsed once, when the builder is created
//! - `build` is pure: the same snapshot always yields the same Resources
//! - Wildcard hosts are encoded like concrete ones; precedence between them is
//!   whatever the registry resolves

use std::collections::BTreeMap;

use crate::config::schema::BigIpConfig;
use crate::observability::metrics;
use crate::registry::{Endpoint, RouteEntry, Uri};
use crate::resources::ordering::sort_rules;
use crate::resources::reference::parse_references;
use crate::resources::types::{
    Action, Condition, Member, Monitor, NameRef, Policy, Pool, ProfileContext, ProfileRef,
    Resources, Rule, SourceAddressTranslation, Virtual,
};

pub const HTTP_VIRTUAL_NAME: &str = "routing-vip-http";
pub const HTTPS_VIRTUAL_NAME: &str = "routing-vip-https";

const HTTP_PORT: u16 = 80;
const HTTPS_PORT: u16 = 443;
const MEMBER_SESSION: &str = "user-enabled";
const POLICY_STRATEGY: &str = "/Common/first-match";
const MONITOR_TYPE: &str = "http";
const MONITOR_INTERVAL: u32 = 5;
const MONITOR_TIMEOUT: u32 = 16;
const MONITOR_SEND: &str = "GET / HTTP/1.0\r\n\r\n";

/// Builds [`Resources`] from the static configuration and registry snapshots.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    partition: String,
    external_addr: String,
    balance: String,
    monitors: Vec<NameRef>,
    ssl_profiles: Vec<NameRef>,
    profiles: Vec<NameRef>,
    policies: Vec<NameRef>,
    routing_policy: NameRef,
}

impl ConfigBuilder {
    /// Create a builder from a validated device configuration.
    ///
    /// Malformed references are logged and left out here, once, rather than
    /// on every build.
    pub fn new(config: &BigIpConfig) -> Self {
        let partition = config.partitions.first().cloned().unwrap_or_default();
        let routing_policy = NameRef::new(partition.clone(), format!("{}-routing-policy", partition));

        let mut policies: Vec<NameRef> = Vec::new();
        for policy in parse_references("policy", &config.policies) {
            if policy == routing_policy || policies.contains(&policy) {
                tracing::debug!(policy = %policy.full_path(), "Dropping duplicate policy reference");
                continue;
            }
            policies.push(policy);
        }
        policies.push(routing_policy.clone());

        Self {
            external_addr: config.external_addr.clone(),
            balance: config.balance.clone(),
            monitors: parse_references("health-monitor", &config.health_monitors),
            ssl_profiles: parse_references("ssl-profile", &config.ssl_profiles),
            profiles: parse_references("profile", &config.profiles),
            policies,
            routing_policy,
            partition,
        }
    }

    /// The partition holding every generated object.
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// The generated routing policy.
    pub fn routing_policy(&self) -> &NameRef {
        &self.routing_policy
    }

    /// Policies attached to each routing virtual: operator policies first,
    /// the routing policy last.
    pub fn virtual_policies(&self) -> &[NameRef] {
        &self.policies
    }

    /// Build the complete resource set for one snapshot.
    pub fn build(&self, snapshot: &[RouteEntry]) -> Resources {
        let mut routes: BTreeMap<&Uri, BTreeMap<String, &Endpoint>> = BTreeMap::new();
        for entry in snapshot {
            if entry.uri.is_empty() {
                tracing::warn!(
                    event = "skipping-update",
                    endpoints = entry.endpoints.len(),
                    "Skipping route with an empty URI"
                );
                metrics::record_skipped("empty-uri");
                continue;
            }
            let members = routes.entry(&entry.uri).or_default();
            for endpoint in &entry.endpoints {
                members.insert(endpoint.canonical_addr(), endpoint);
            }
        }

        let monitor_paths: Vec<String> = self.monitors.iter().map(NameRef::full_path).collect();
        let mut pools = Vec::with_capacity(routes.len());
        let mut rules = Vec::with_capacity(routes.len());

        for (uri, members) in routes {
            if members.is_empty() {
                continue;
            }
            let pool = self.pool_for(uri, members.values().copied(), &monitor_paths);
            rules.push(self.rule_for(uri, &pool));
            pools.push(pool);
        }

        sort_rules(&mut rules);

        Resources {
            virtuals: self.virtuals(),
            pools,
            monitors: self.monitor_defs(),
            policies: vec![Policy {
                name: self.routing_policy.name.clone(),
                partition: self.routing_policy.partition.clone(),
                controls: vec!["forwarding".to_string()],
                requires: vec!["http".to_string()],
                strategy: POLICY_STRATEGY.to_string(),
                legacy: true,
                rules,
            }],
        }
    }

    fn pool_for<'a>(
        &self,
        uri: &Uri,
        endpoints: impl Iterator<Item = &'a Endpoint>,
        monitor_paths: &[String],
    ) -> Pool {
        Pool {
            name: pool_name(uri),
            partition: self.partition.clone(),
            load_balancing_mode: self.balance.clone(),
            members: endpoints
                .map(|ep| Member {
                    address: ep.address.clone(),
                    port: ep.port,
                    session: MEMBER_SESSION.to_string(),
                })
                .collect(),
            monitors: monitor_paths.to_vec(),
            description: uri.to_string(),
        }
    }

    fn rule_for(&self, uri: &Uri, pool: &Pool) -> Rule {
        let host = uri.host();
        let wildcard_suffix = if uri.is_wildcard() { host.strip_prefix('*') } else { None };
        let mut conditions = vec![match wildcard_suffix {
            Some(suffix) => Condition {
                name: "0".to_string(),
                http_host: true,
                host: true,
                ends_with: true,
                request: true,
                values: vec![suffix.to_string()],
                ..Default::default()
            },
            None => Condition {
                name: "0".to_string(),
                http_host: true,
                host: true,
                equals: true,
                request: true,
                values: vec![host.to_string()],
                ..Default::default()
            },
        }];

        for (i, segment) in uri.path_segments().into_iter().enumerate() {
            conditions.push(Condition {
                name: (i + 1).to_string(),
                http_uri: true,
                path_segment: true,
                index: Some(i + 1),
                equals: true,
                request: true,
                values: vec![segment.to_string()],
                ..Default::default()
            });
        }

        Rule {
            name: pool.name.clone(),
            full_uri: uri.to_string(),
            ordinal: 0,
            description: uri.to_string(),
            conditions,
            actions: vec![Action {
                name: "0".to_string(),
                forward: true,
                request: true,
                pool: NameRef::new(pool.partition.clone(), pool.name.clone()).full_path(),
            }],
        }
    }

    fn virtuals(&self) -> Vec<Virtual> {
        let generic: Vec<ProfileRef> = self
            .profiles
            .iter()
            .map(|p| ProfileRef::from_name_ref(p, ProfileContext::All))
            .collect();

        let mut virtuals = vec![self.routing_virtual(HTTP_VIRTUAL_NAME, HTTP_PORT, generic.clone())];

        if !self.ssl_profiles.is_empty() {
            let mut profiles = generic;
            profiles.extend(
                self.ssl_profiles
                    .iter()
                    .map(|p| ProfileRef::from_name_ref(p, ProfileContext::Clientside)),
            );
            virtuals.push(self.routing_virtual(HTTPS_VIRTUAL_NAME, HTTPS_PORT, profiles));
        }

        virtuals
    }

    fn routing_virtual(&self, name: &str, port: u16, profiles: Vec<ProfileRef>) -> Virtual {
        Virtual {
            name: name.to_string(),
            partition: self.partition.clone(),
            destination: destination(&self.partition, &self.external_addr, port),
            enabled: true,
            ip_protocol: "tcp".to_string(),
            pool: None,
            source_address_translation: SourceAddressTranslation::default(),
            policies: self.policies.clone(),
            profiles,
        }
    }

    fn monitor_defs(&self) -> Vec<Monitor> {
        self.monitors
            .iter()
            .map(|m| Monitor {
                name: m.name.clone(),
                partition: m.partition.clone(),
                monitor_type: MONITOR_TYPE.to_string(),
                interval: MONITOR_INTERVAL,
                timeout: MONITOR_TIMEOUT,
                send: MONITOR_SEND.to_string(),
            })
            .collect()
    }
}

/// Virtual server destination. IPv6 addresses separate the port with `.`.
fn destination(partition: &str, addr: &str, port: u16) -> String {
    let separator = if addr.contains(':') { '.' } else { ':' };
    format!("/{}/{}{}{}", partition, addr, separator, port)
}

/// Device object name for the pool serving `uri`.
///
/// Letters, digits, `.` and `-` are kept; every other byte becomes `_XX`
/// (uppercase hex), so distinct URIs never share a name.
pub fn pool_name(uri: &Uri) -> String {
    let mut name = String::with_capacity(uri.as_str().len());
    for byte in uri.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("_{:02X}", byte));
        }
    }
    name
}
