//! Static route seeding from configuration.

use std::collections::HashSet;

use crate::config::schema::{EndpointConfig, RouteConfig};
use crate::registry::route::{Endpoint, Uri};
use crate::registry::Registry;

/// Convert a configured endpoint into a registry endpoint.
pub fn endpoint_from_config(config: &EndpointConfig) -> Endpoint {
    let endpoint = Endpoint::new(config.address.clone(), config.port);
    match &config.instance_id {
        Some(id) => endpoint.with_instance_id(id.clone()),
        None => endpoint,
    }
}

fn flatten(routes: &[RouteConfig]) -> Vec<(Uri, Endpoint)> {
    routes
        .iter()
        .flat_map(|route| {
            let uri = Uri::new(&route.uri);
            route
                .endpoints
                .iter()
                .map(move |ep| (uri.clone(), endpoint_from_config(ep)))
        })
        .collect()
}

/// Move the registry from the `previous` seed set to the `next` one.
///
/// Pairs present only in `previous` are unregistered, pairs present only in
/// `next` are registered; shared pairs are left untouched. Returns the number
/// of (registered, unregistered) pairs.
pub fn apply_route_seeds(
    registry: &dyn Registry,
    previous: &[RouteConfig],
    next: &[RouteConfig],
) -> (usize, usize) {
    let old = flatten(previous);
    let new = flatten(next);
    let old_set: HashSet<&(Uri, Endpoint)> = old.iter().collect();
    let new_set: HashSet<&(Uri, Endpoint)> = new.iter().collect();

    let mut unregistered = 0;
    for pair in old.iter().filter(|p| !new_set.contains(p)) {
        registry.unregister(&pair.0, &pair.1);
        unregistered += 1;
    }

    let mut registered = 0;
    for pair in new.iter().filter(|p| !old_set.contains(p)) {
        registry.register(&pair.0, pair.1.clone());
        registered += 1;
    }

    tracing::info!(registered, unregistered, "Applied static route seeds");
    (registered, unregistered)
}
