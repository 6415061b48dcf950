//! Route registry value types.

use std::fmt;

/// A route key: hostname with an optional path.
///
/// Keys are normalized to lowercase, runs of `/` collapse to one and any
/// trailing `/` is removed, so `Foo.CF.com//a/` and `foo.cf.com/a` address
/// the same route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri(String);

impl Uri {
    /// Create a normalized route key.
    pub fn new(uri: impl AsRef<str>) -> Self {
        let lowered = uri.as_ref().trim().to_lowercase();
        let mut key = String::with_capacity(lowered.len());
        for ch in lowered.chars() {
            if ch == '/' && key.ends_with('/') {
                continue;
            }
            key.push(ch);
        }
        Self(key.trim_end_matches('/').to_string())
    }

    /// The normalized key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The hostname portion (everything before the first `/`).
    pub fn host(&self) -> &str {
        match self.0.find('/') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Path segments after the hostname, in order.
    pub fn path_segments(&self) -> Vec<&str> {
        match self.0.find('/') {
            Some(idx) => self.0[idx + 1..].split('/').collect(),
            None => Vec::new(),
        }
    }

    /// True for `*.domain` style hosts.
    pub fn is_wildcard(&self) -> bool {
        self.host().starts_with("*.")
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

/// A backend instance serving a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Backend IP address.
    pub address: String,
    /// Backend port.
    pub port: u16,
    /// Identity of the application instance behind the address.
    pub private_instance_id: String,
}

impl Endpoint {
    /// Create an endpoint whose instance identity is its canonical address.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        let address = address.into();
        let private_instance_id = format!("{}:{}", address, port);
        Self {
            address,
            port,
            private_instance_id,
        }
    }

    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.private_instance_id = id.into();
        self
    }

    /// `address:port`, the identity used for pool membership.
    pub fn canonical_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Point-in-time view of the endpoints registered under one URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolView {
    endpoints: Vec<Endpoint>,
}

impl PoolView {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    /// Find an endpoint by canonical address.
    pub fn find_by_id(&self, canonical_addr: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|e| e.canonical_addr() == canonical_addr)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// One URI with its current endpoints, as seen by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub uri: Uri,
    pub endpoints: Vec<Endpoint>,
}

/// Kind of registry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Register,
    Unregister,
}

/// Change notification published by a registry after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteUpdate {
    pub action: RouteAction,
    pub uri: Uri,
    pub endpoint: Endpoint,
}
