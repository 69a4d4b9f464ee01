//! xDS Snapshot Controller Library
//!
//! Turns `NodeConfigCache` custom resources into versioned, per-node Envoy
//! configuration snapshots and publishes them to a snapshot store read by a
//! discovery server.
//!
//! ## Quick Start
//!
//! ```rust
//! use xds_snapshot_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod envoy;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod snapshot;
