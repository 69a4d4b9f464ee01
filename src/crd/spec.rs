//! # NodeConfigCache Spec
//!
//! The declarative desired state of one node's configuration snapshot.

use crate::envoy::{Format, ResourceKind};
use schemars::{json_schema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};

/// NodeConfigCache Custom Resource Definition
///
/// Declares every resource that the proxy identified by `nodeID` should
/// receive. Each change publishes a new snapshot if the content differs
/// from what is currently served.
///
/// # Example
///
/// ```yaml
/// apiVersion: caches.xds-snapshot.io/v1alpha1
/// kind: NodeConfigCache
/// metadata:
///   name: edge-proxy
///   namespace: default
/// spec:
///   nodeID: edge-proxy-1
///   version: "1"
///   format: human-readable
///   resources:
///     clusters:
///       - name: backend
///         value: |
///           name: backend
///           connect_timeout: 0.25s
///     secrets:
///       - name: edge-cert
///         ref:
///           name: edge-proxy-tls
/// ```
#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "NodeConfigCache",
    group = "caches.xds-snapshot.io",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::NodeConfigCacheStatus",
    shortname = "ncc",
    printcolumn = r#"{"name":"Node", "type":"string", "jsonPath":".spec.nodeID"}, {"name":"Version", "type":"string", "jsonPath":".status.publishedVersion"}, {"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Description", "type":"string", "jsonPath":".status.description"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigCacheSpec {
    /// Node ID of the proxy that receives this snapshot
    #[serde(rename = "nodeID")]
    pub node_id: String,
    /// Version reported to the proxy for the published snapshot
    pub version: String,
    /// Text format of every `value` in `resources`
    /// Values: structured (JSON), human-readable (YAML), encoded-structured (base64 JSON)
    /// Default: structured
    #[serde(default, alias = "serialization")]
    #[schemars(schema_with = "format_schema")]
    pub format: Format,
    #[serde(default)]
    pub resources: Resources,
}

fn format_schema(_gen: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "string",
        "enum": ["structured", "human-readable", "encoded-structured", "json", "yaml", "b64json"],
        "default": "structured",
        "description": "Text format of every resource value. json, yaml and b64json are accepted as legacy names."
    })
}

/// Resource lists by kind
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default)]
    pub endpoints: Vec<ResourceEntry>,
    #[serde(default)]
    pub clusters: Vec<ResourceEntry>,
    #[serde(default)]
    pub routes: Vec<ResourceEntry>,
    #[serde(default)]
    pub listeners: Vec<ResourceEntry>,
    #[serde(default)]
    pub runtimes: Vec<ResourceEntry>,
    /// TLS secrets read from Kubernetes Secrets
    #[serde(default)]
    pub secrets: Vec<SecretEntry>,
}

impl Resources {
    /// Inline entries of a non-secret kind
    ///
    /// Secrets are declared by reference and always yield an empty slice here.
    #[must_use]
    pub fn entries(&self, kind: ResourceKind) -> &[ResourceEntry] {
        match kind {
            ResourceKind::Endpoint => &self.endpoints,
            ResourceKind::Cluster => &self.clusters,
            ResourceKind::Route => &self.routes,
            ResourceKind::Listener => &self.listeners,
            ResourceKind::Runtime => &self.runtimes,
            ResourceKind::Secret => &[],
        }
    }

    /// Total number of declared entries across all kinds
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
            + self.clusters.len()
            + self.routes.len()
            + self.listeners.len()
            + self.runtimes.len()
            + self.secrets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A resource given inline as encoded text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    /// Name the resource is served under
    pub name: String,
    /// Resource body in the spec's format
    pub value: String,
}

/// A TLS secret served under `name`, read from a Kubernetes Secret
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretEntry {
    /// Name the secret is served under, independent of the Kubernetes Secret name
    pub name: String,
    #[serde(rename = "ref")]
    pub secret_ref: SecretRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
    /// Defaults to the namespace of the NodeConfigCache
    #[serde(default)]
    pub namespace: Option<String>,
}

impl SecretRef {
    /// Namespace to read from, falling back to the owner's namespace
    #[must_use]
    pub fn namespace_or<'a>(&'a self, owner_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(owner_namespace)
    }
}
