//! # CRD Generator
//!
//! Generates the Kubernetes CustomResourceDefinition YAML for `NodeConfigCache`
//! from the Rust type definitions.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/nodeconfigcache.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use xds_snapshot_controller::crd::NodeConfigCache;

fn main() -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&NodeConfigCache::crd())?;
    print!("{yaml}");
    Ok(())
}
