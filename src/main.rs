//! # xDS Snapshot Controller
//!
//! A Kubernetes controller that watches `NodeConfigCache` resources and keeps
//! one Envoy configuration snapshot per node in sync with them.
//!
//! ## Overview
//!
//! 1. **Watching caches** - Monitors `NodeConfigCache` resources in one or all namespaces
//! 2. **Decoding resources** - Parses endpoints, clusters, routes, listeners and runtimes
//!    in the format declared by the spec
//! 3. **Resolving secrets** - Reads TLS material from referenced Kubernetes Secrets
//! 4. **Publishing** - Replaces the node's snapshot when its content changed
//!
//! Operational surface: Prometheus metrics, health probes and snapshot
//! summaries on the HTTP port.

use anyhow::Result;
use xds_snapshot_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    run_watch_loop(init.caches, init.reconciler, init.server_state, init.config).await
}
