//! # Snapshots
//!
//! A [`Snapshot`] is the complete, versioned resource set served to one node.
//!
//! Snapshots are assembled from scratch on every reconciliation through
//! [`SnapshotBuilder`] and never mutated afterwards. Every kind is always
//! present, possibly with no resources, so lookups by kind cannot miss.
//!
//! - `diff.rs` - content equality, publish policy and change listing
//! - `store.rs` - the per-node store snapshots are published to

mod diff;
mod store;

pub use diff::{snapshots_equal, PublishPolicy, SnapshotDiff};
pub use store::{InMemorySnapshotCache, SnapshotStore, StoreError};

use crate::envoy::{Resource, ResourceKind};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Resources of one kind, keyed by resource name
pub type ResourceMap = BTreeMap<String, Resource>;

/// Immutable, versioned resource set for one node
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    node_id: String,
    version: String,
    resources: BTreeMap<ResourceKind, ResourceMap>,
}

impl Snapshot {
    #[must_use]
    pub fn builder(node_id: impl Into<String>, version: impl Into<String>) -> SnapshotBuilder {
        SnapshotBuilder::new(node_id, version)
    }

    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Version shared by every kind in the snapshot
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resources of `kind`, keyed by name
    #[must_use]
    pub fn resources(&self, kind: ResourceKind) -> &ResourceMap {
        // The builder seeds every kind.
        static EMPTY: ResourceMap = BTreeMap::new();
        self.resources.get(&kind).unwrap_or(&EMPTY)
    }

    #[must_use]
    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&Resource> {
        self.resources(kind).get(name)
    }

    /// Total number of resources across all kinds
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resource names per kind without any resource content
    ///
    /// Safe to expose over HTTP, as secret material never appears in it.
    #[must_use]
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            node_id: self.node_id.clone(),
            version: self.version.clone(),
            resources: ResourceKind::ALL
                .into_iter()
                .map(|kind| {
                    let names = self.resources(kind).keys().cloned().collect();
                    (
                        kind,
                        KindSummary {
                            type_url: kind.type_url(),
                            names,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Names-only view of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    #[serde(rename = "nodeID")]
    pub node_id: String,
    pub version: String,
    pub resources: BTreeMap<ResourceKind, KindSummary>,
}

/// Resource names of one kind, with the type URL they are served under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSummary {
    pub type_url: &'static str,
    pub names: Vec<String>,
}

/// A second resource with the same name and kind
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate {kind} resource '{name}'")]
pub struct DuplicateResource {
    pub kind: ResourceKind,
    pub name: String,
}

/// Assembles a [`Snapshot`]; rejects duplicate names within a kind
#[derive(Debug)]
pub struct SnapshotBuilder {
    node_id: String,
    version: String,
    resources: BTreeMap<ResourceKind, ResourceMap>,
}

impl SnapshotBuilder {
    fn new(node_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            version: version.into(),
            resources: ResourceKind::ALL
                .into_iter()
                .map(|kind| (kind, ResourceMap::new()))
                .collect(),
        }
    }

    /// Add a resource under `name`, keyed by the resource's own kind
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        resource: Resource,
    ) -> Result<(), DuplicateResource> {
        let kind = resource.kind();
        let name = name.into();
        let resources = self.resources.entry(kind).or_default();
        if resources.contains_key(&name) {
            return Err(DuplicateResource { kind, name });
        }
        resources.insert(name, resource);
        Ok(())
    }

    /// Chainable variant of [`SnapshotBuilder::insert`]
    pub fn with(
        mut self,
        name: impl Into<String>,
        resource: Resource,
    ) -> Result<Self, DuplicateResource> {
        self.insert(name, resource)?;
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> Snapshot {
        Snapshot {
            node_id: self.node_id,
            version: self.version,
            resources: self.resources,
        }
    }
}
