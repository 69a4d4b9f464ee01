//! # Envoy Resource Schemas
//!
//! Typed subset of the Envoy v2 API for the six resource kinds a snapshot
//! carries. Fields are written with their proto names in `snake_case`; the
//! lowerCamelCase names of the proto3 JSON mapping are accepted on input.
//! Unknown fields are rejected so that typos surface as schema errors instead
//! of silently disappearing from the published configuration.

mod cluster;
mod common;
mod endpoint;
mod listener;
mod route;
mod runtime;
mod secret;

pub use common::{
    Address, DataSource, HealthStatus, Locality, Metadata, Pipe, ProtoDuration, SocketAddress,
    SocketProtocol, TransportSocket,
};
pub use cluster::{Cluster, DiscoveryType, DnsLookupFamily, EdsClusterConfig, LbPolicy};
pub use endpoint::{ClusterLoadAssignment, Endpoint, HealthCheckConfig, LbEndpoint, LocalityLbEndpoints};
pub use listener::{DrainType, Filter, FilterChain, Listener, TrafficDirection};
pub use route::{
    DirectResponseAction, Route, RouteAction, RouteConfiguration, RouteMatch, TlsRequirementType,
    VirtualHost,
};
pub use runtime::Runtime;
pub use secret::{Secret, TlsCertificate};

/// A required-field or oneof rule broken by an otherwise well-formed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted path of the offending field relative to the resource root
    pub field: String,
    pub message: String,
}

impl SchemaViolation {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefix the field path with the enclosing message's field
    pub(crate) fn within(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }
}
