//! Output configuration model.
//!
//! These types serialize into the document handed to the sink. Field names
//! follow the device driver's JSON schema (camelCase).

use serde::{Deserialize, Serialize};

use crate::config::schema::{BigIpConfig, GlobalConfig};

/// A `partition/name` reference to an object on the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
    pub partition: String,
}

impl NameRef {
    pub fn new(partition: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition: partition.into(),
        }
    }

    /// Fully qualified device path, `/partition/name`.
    pub fn full_path(&self) -> String {
        format!("/{}/{}", self.partition, self.name)
    }
}

/// Side of the connection a profile applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileContext {
    All,
    Clientside,
}

/// A profile attached to a virtual server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    pub name: String,
    pub partition: String,
    pub context: ProfileContext,
}

impl ProfileRef {
    pub fn from_name_ref(reference: &NameRef, context: ProfileContext) -> Self {
        Self {
            name: reference.name.clone(),
            partition: reference.partition.clone(),
            context,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAddressTranslation {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for SourceAddressTranslation {
    fn default() -> Self {
        Self {
            kind: "automap".to_string(),
        }
    }
}

/// A load-balancer front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Virtual {
    pub name: String,
    pub partition: String,
    /// `/partition/address:port` (`.` separates the port for IPv6).
    pub destination: String,
    pub enabled: bool,
    pub ip_protocol: String,
    /// Default pool; routing virtuals dispatch through policies instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    pub source_address_translation: SourceAddressTranslation,
    pub policies: Vec<NameRef>,
    pub profiles: Vec<ProfileRef>,
}

/// A pool member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub address: String,
    pub port: u16,
    pub session: String,
}

/// Backend pool serving one URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub name: String,
    pub partition: String,
    pub load_balancing_mode: String,
    /// Sorted by canonical address.
    pub members: Vec<Member>,
    /// Monitor paths (`/partition/name`).
    pub monitors: Vec<String>,
    pub description: String,
}

/// Health monitor definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub name: String,
    pub partition: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub interval: u32,
    pub timeout: u32,
    pub send: String,
}

/// Rule match condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Condition {
    pub name: String,
    #[serde(skip_serializing_if = "is_false")]
    pub http_host: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub host: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub http_uri: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub path_segment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "is_false")]
    pub equals: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub ends_with: bool,
    pub request: bool,
    pub values: Vec<String>,
}

/// Rule action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub name: String,
    pub forward: bool,
    pub request: bool,
    /// Target pool path.
    pub pool: String,
}

/// One match-and-forward rule of a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub name: String,
    /// URI the rule was generated from; the sort key.
    #[serde(skip)]
    pub full_uri: String,
    pub ordinal: usize,
    pub description: String,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

/// L7 traffic-management policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub partition: String,
    pub controls: Vec<String>,
    pub requires: Vec<String>,
    pub strategy: String,
    pub legacy: bool,
    pub rules: Vec<Rule>,
}

/// Everything built in one reconciliation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub virtuals: Vec<Virtual>,
    pub pools: Vec<Pool>,
    pub monitors: Vec<Monitor>,
    pub policies: Vec<Policy>,
}

impl Resources {
    pub fn rule_count(&self) -> usize {
        self.policies.iter().map(|p| p.rules.len()).sum()
    }
}

/// The document written to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub global: GlobalConfig,
    pub bigip: BigIpConfig,
    pub resources: Resources,
}

fn is_false(value: &bool) -> bool {
    !*value
}
