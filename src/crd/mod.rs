//! # Custom Resource Definitions
//!
//! CRD types for the xDS snapshot controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `NodeConfigCache` specification and resource entries
//! - `status.rs` - Status types for tracking publication state

mod spec;
mod status;

pub use spec::{
    NodeConfigCache, NodeConfigCacheSpec, ResourceEntry, Resources, SecretEntry, SecretRef,
};
pub use status::{Condition, NodeConfigCacheStatus, Phase};

/// API group of the custom resource
pub const GROUP: &str = "caches.xds-snapshot.io";

/// Kind of the custom resource
pub const KIND: &str = "NodeConfigCache";
