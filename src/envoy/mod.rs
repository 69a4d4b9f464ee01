//! # Envoy Resource Model
//!
//! The closed set of resource kinds a node snapshot is made of, and the
//! kind-tagged [`Resource`] union that every decoded value is stored as.
//!
//! Dispatch on kind is always a `match` over [`ResourceKind`] / [`Resource`],
//! so adding a kind is a compile error everywhere it needs handling.

pub mod serializer;
pub mod types;

pub use serializer::{DecodeError, DecodeFn, Format};

use serde::{Deserialize, Serialize};
use std::fmt;
use types::{Cluster, ClusterLoadAssignment, Listener, RouteConfiguration, Runtime, SchemaViolation, Secret};

/// Resource kinds served to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Endpoint,
    Cluster,
    Route,
    Listener,
    Secret,
    Runtime,
}

impl ResourceKind {
    /// Every kind, in declaration order
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Endpoint,
        ResourceKind::Cluster,
        ResourceKind::Route,
        ResourceKind::Listener,
        ResourceKind::Secret,
        ResourceKind::Runtime,
    ];

    /// Order in which a spec's resource lists are processed
    ///
    /// Only affects which error is reported first when several entries are
    /// invalid. Secrets come last because they need external lookups.
    pub const LOAD_ORDER: [ResourceKind; 6] = [
        ResourceKind::Endpoint,
        ResourceKind::Cluster,
        ResourceKind::Route,
        ResourceKind::Listener,
        ResourceKind::Runtime,
        ResourceKind::Secret,
    ];

    /// Name of the list under `spec.resources` holding this kind
    #[must_use]
    pub const fn spec_field(self) -> &'static str {
        match self {
            ResourceKind::Endpoint => "endpoints",
            ResourceKind::Cluster => "clusters",
            ResourceKind::Route => "routes",
            ResourceKind::Listener => "listeners",
            ResourceKind::Secret => "secrets",
            ResourceKind::Runtime => "runtimes",
        }
    }

    /// xDS type URL of the v2 API message
    #[must_use]
    pub const fn type_url(self) -> &'static str {
        match self {
            ResourceKind::Endpoint => "type.googleapis.com/envoy.api.v2.ClusterLoadAssignment",
            ResourceKind::Cluster => "type.googleapis.com/envoy.api.v2.Cluster",
            ResourceKind::Route => "type.googleapis.com/envoy.api.v2.RouteConfiguration",
            ResourceKind::Listener => "type.googleapis.com/envoy.api.v2.Listener",
            ResourceKind::Secret => "type.googleapis.com/envoy.api.v2.auth.Secret",
            ResourceKind::Runtime => "type.googleapis.com/envoy.service.discovery.v2.Runtime",
        }
    }

    /// Case-insensitive lookup by kind name or spec list name
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.to_ascii_lowercase();
        ResourceKind::ALL.into_iter().find(|kind| {
            kind.to_string().to_ascii_lowercase() == value || kind.spec_field() == value
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Endpoint => "Endpoint",
            ResourceKind::Cluster => "Cluster",
            ResourceKind::Route => "Route",
            ResourceKind::Listener => "Listener",
            ResourceKind::Secret => "Secret",
            ResourceKind::Runtime => "Runtime",
        };
        f.write_str(name)
    }
}

/// A decoded resource tagged with its kind
///
/// Equality is structural: two values decoded from differently formatted
/// text compare equal when they describe the same configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Endpoint(ClusterLoadAssignment),
    Cluster(Cluster),
    Route(RouteConfiguration),
    Listener(Listener),
    Secret(Secret),
    Runtime(Runtime),
}

impl Resource {
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Resource::Endpoint(_) => ResourceKind::Endpoint,
            Resource::Cluster(_) => ResourceKind::Cluster,
            Resource::Route(_) => ResourceKind::Route,
            Resource::Listener(_) => ResourceKind::Listener,
            Resource::Secret(_) => ResourceKind::Secret,
            Resource::Runtime(_) => ResourceKind::Runtime,
        }
    }

    /// Check required fields and oneof groups that serde cannot express
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        match self {
            Resource::Endpoint(endpoint) => endpoint.validate(),
            Resource::Cluster(cluster) => cluster.validate(),
            Resource::Route(route) => route.validate(),
            Resource::Listener(listener) => listener.validate(),
            Resource::Secret(secret) => secret.validate(),
            Resource::Runtime(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_order_puts_secrets_last() {
        assert_eq!(ResourceKind::LOAD_ORDER.last(), Some(&ResourceKind::Secret));
        let mut sorted = ResourceKind::LOAD_ORDER.to_vec();
        sorted.sort();
        assert_eq!(sorted, ResourceKind::ALL.to_vec());
    }

    #[test]
    fn test_parse_accepts_kind_and_field_names() {
        assert_eq!(ResourceKind::parse("cluster"), Some(ResourceKind::Cluster));
        assert_eq!(ResourceKind::parse("Clusters"), Some(ResourceKind::Cluster));
        assert_eq!(ResourceKind::parse("runtimes"), Some(ResourceKind::Runtime));
        assert_eq!(ResourceKind::parse("virtualhost"), None);
    }

    #[test]
    fn test_runtime_has_no_required_fields() {
        let resource = Resource::Runtime(Runtime::default());
        assert_eq!(resource.kind(), ResourceKind::Runtime);
        assert!(resource.validate().is_ok());
    }
}
