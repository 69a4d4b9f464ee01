//! # Validate Command
//!
//! Decodes every inline resource of one or more `NodeConfigCache` manifests
//! the same way the controller does.

use anyhow::{Context, Result};
use serde::Deserialize;
use xds_snapshot_controller::controller::reconciler::{ObjectKey, ResourceLoader};
use xds_snapshot_controller::crd::NodeConfigCache;
use xds_snapshot_controller::envoy::ResourceKind;

/// Validate every document in `input`, failing on the first invalid one
pub fn validate_command(input: &str) -> Result<()> {
    let mut validated = 0;

    for document in serde_yaml::Deserializer::from_str(input) {
        let value = serde_yaml::Value::deserialize(document).context("Manifest is not valid YAML")?;
        if value.is_null() {
            continue;
        }
        let cache: NodeConfigCache =
            serde_yaml::from_value(value).context("Document is not a NodeConfigCache")?;
        println!("{}", validate_cache(&cache)?);
        validated += 1;
    }

    if validated == 0 {
        anyhow::bail!("No NodeConfigCache documents found");
    }
    Ok(())
}

/// Decode one object and describe the resulting snapshot
pub fn validate_cache(cache: &NodeConfigCache) -> Result<String> {
    let key = ObjectKey::of(cache);
    let loader = ResourceLoader::new(&key, cache.spec.format.decoder());

    let snapshot = match loader.load_static(&cache.spec) {
        Ok(builder) => builder.build(),
        Err(error) => match error.validation_error() {
            Some(validation) => anyhow::bail!("{validation}"),
            None => return Err(error.into()),
        },
    };

    let mut lines = vec![format!(
        "{key}: node '{}' version '{}' ({} format) is valid",
        snapshot.node_id(),
        snapshot.version(),
        cache.spec.format
    )];
    for kind in ResourceKind::ALL {
        let names: Vec<&str> = if kind == ResourceKind::Secret {
            cache
                .spec
                .resources
                .secrets
                .iter()
                .map(|entry| entry.name.as_str())
                .collect()
        } else {
            snapshot.resources(kind).keys().map(String::as_str).collect()
        };
        if names.is_empty() {
            continue;
        }
        let suffix = if kind == ResourceKind::Secret {
            " (not resolved)"
        } else {
            ""
        };
        lines.push(format!("  {}: {}{suffix}", kind.spec_field(), names.join(", ")));
    }
    Ok(lines.join("\n"))
}
