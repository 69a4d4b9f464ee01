//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use xds_snapshot_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Resource model and encodings
pub use crate::envoy::{DecodeError, Format, Resource, ResourceKind};

// Snapshots and the store seam
pub use crate::snapshot::{
    InMemorySnapshotCache, PublishPolicy, Snapshot, SnapshotDiff, SnapshotStore, StoreError,
};

// Reconciler types
pub use crate::controller::reconciler::{
    reconcile, reconcile_node, ErrorClass, ReconcileOutcome, Reconciler, ReconcilerError,
    ResourceLoader, SecretResolver, SecretSource, ValidationError,
};

pub use crate::config::ControllerConfig;
