//! # Convert Command
//!
//! Re-encodes a single resource value from one format into another.

use anyhow::{Context, Result};
use xds_snapshot_controller::envoy::{Format, ResourceKind};

/// Decode `input` as `kind` in format `from`, then encode it in format `to`
///
/// The value is fully validated on the way through, so the output always
/// decodes back to the same resource.
pub fn convert(input: &str, kind: ResourceKind, from: Format, to: Format) -> Result<String> {
    let resource = from
        .decode(input.trim(), kind)
        .with_context(|| format!("Input is not a valid {kind} in {from} format"))?;
    let output = to
        .encode(&resource)
        .with_context(|| format!("Failed to encode {kind} as {to}"))?;
    Ok(output)
}
