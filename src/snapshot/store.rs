//! # Snapshot Store
//!
//! Where published snapshots live, keyed by node ID. The discovery server
//! reads from the same store.
//!
//! `get_snapshot` and `set_snapshot` are atomic per node ID: a reader sees
//! either the previous snapshot or the new one, never a mix. Nodes do not
//! contend with each other.

use super::Snapshot;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),

    #[error("snapshot for node '{actual}' cannot be stored under node '{expected}'")]
    NodeMismatch { expected: String, actual: String },
}

/// Per-node snapshot holder consumed by the reconciler
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Currently published snapshot, `None` if nothing was published yet
    async fn get_snapshot(&self, node_id: &str) -> Result<Option<Arc<Snapshot>>, StoreError>;

    /// Replace the published snapshot for `node_id` as a single unit
    async fn set_snapshot(&self, node_id: &str, snapshot: Arc<Snapshot>) -> Result<(), StoreError>;
}

/// In-process snapshot cache shared with the discovery server
#[derive(Debug, Default)]
pub struct InMemorySnapshotCache {
    snapshots: DashMap<String, Arc<Snapshot>>,
}

impl InMemorySnapshotCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Node IDs with a published snapshot, sorted
    #[must_use]
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .snapshots
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Synchronous lookup for callers outside the reconcile path
    #[must_use]
    pub fn snapshot(&self, node_id: &str) -> Option<Arc<Snapshot>> {
        self.snapshots.get(node_id).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotCache {
    async fn get_snapshot(&self, node_id: &str) -> Result<Option<Arc<Snapshot>>, StoreError> {
        Ok(self.snapshot(node_id))
    }

    async fn set_snapshot(&self, node_id: &str, snapshot: Arc<Snapshot>) -> Result<(), StoreError> {
        if snapshot.node_id() != node_id {
            return Err(StoreError::NodeMismatch {
                expected: node_id.to_string(),
                actual: snapshot.node_id().to_string(),
            });
        }
        self.snapshots.insert(node_id.to_string(), snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_replaces_whole_snapshot() {
        let cache = InMemorySnapshotCache::new();
        assert!(cache.get_snapshot("node-a").await.unwrap().is_none());

        let first = Arc::new(Snapshot::builder("node-a", "1").build());
        cache.set_snapshot("node-a", first).await.unwrap();
        let second = Arc::new(Snapshot::builder("node-a", "2").build());
        cache.set_snapshot("node-a", second).await.unwrap();

        let current = cache.get_snapshot("node-a").await.unwrap().unwrap();
        assert_eq!(current.version(), "2");
        assert_eq!(cache.node_ids(), vec!["node-a".to_string()]);
    }

    #[tokio::test]
    async fn test_set_rejects_foreign_node_snapshot() {
        let cache = InMemorySnapshotCache::new();
        let snapshot = Arc::new(Snapshot::builder("node-b", "1").build());
        let err = cache.set_snapshot("node-a", snapshot).await.unwrap_err();
        assert!(matches!(err, StoreError::NodeMismatch { .. }));
        assert!(cache.is_empty());
    }
}
