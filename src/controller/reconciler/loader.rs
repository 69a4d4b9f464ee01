//! # Resource Loader
//!
//! Assembles a candidate snapshot from a NodeConfigCache spec.
//!
//! Kinds are processed in [`ResourceKind::LOAD_ORDER`]: inline kinds are
//! decoded first, then secret references are resolved. The first invalid
//! entry aborts the load with its exact location; nothing is partially kept.

use super::error::{ObjectKey, ReconcilerError, ResourceLocation};
use super::secrets::SecretResolver;
use crate::crd::{NodeConfigCacheSpec, Resources};
use crate::envoy::{DecodeFn, ResourceKind};
use crate::snapshot::{Snapshot, SnapshotBuilder};
use std::collections::HashMap;
use tracing::debug;

/// Decodes and resolves the resources of one spec
pub struct ResourceLoader<'a> {
    owner: &'a ObjectKey,
    decode: DecodeFn,
}

impl<'a> ResourceLoader<'a> {
    #[must_use]
    pub fn new(owner: &'a ObjectKey, decode: DecodeFn) -> Self {
        Self { owner, decode }
    }

    /// Build the full candidate snapshot, secrets included
    pub async fn load(
        &self,
        spec: &NodeConfigCacheSpec,
        resolver: &SecretResolver<'_>,
    ) -> Result<Snapshot, ReconcilerError> {
        let builder = self.load_static(spec)?;
        let builder = self.resolve_secrets(&spec.resources, builder, resolver).await?;
        Ok(builder.build())
    }

    /// Decode every inline entry, leaving secrets unresolved
    ///
    /// Needs no cluster access, so it also backs offline validation.
    pub fn load_static(&self, spec: &NodeConfigCacheSpec) -> Result<SnapshotBuilder, ReconcilerError> {
        let mut builder = Snapshot::builder(&spec.node_id, &spec.version);

        for kind in ResourceKind::LOAD_ORDER {
            if kind == ResourceKind::Secret {
                continue;
            }
            let entries = spec.resources.entries(kind);
            let mut first_seen: HashMap<&str, usize> = HashMap::with_capacity(entries.len());

            for (index, entry) in entries.iter().enumerate() {
                let location = || ResourceLocation {
                    owner: self.owner.clone(),
                    kind,
                    index,
                    value: entry.value.clone(),
                };

                if let Some(first_index) = first_seen.insert(entry.name.as_str(), index) {
                    return Err(ReconcilerError::DuplicateName {
                        location: location(),
                        name: entry.name.clone(),
                        first_index,
                    });
                }

                let resource = (self.decode)(&entry.value, kind).map_err(|source| {
                    ReconcilerError::Decode {
                        location: location(),
                        source,
                    }
                })?;

                builder
                    .insert(entry.name.as_str(), resource)
                    .map_err(|duplicate| ReconcilerError::DuplicateName {
                        location: location(),
                        first_index: first_index_of(
                            entries.iter().map(|e| e.name.as_str()),
                            &duplicate.name,
                            index,
                        ),
                        name: duplicate.name,
                    })?;
            }

            debug!(kind = %kind, count = entries.len(), "Decoded resources");
        }

        Ok(builder)
    }

    /// Resolve every secret reference into the builder
    pub async fn resolve_secrets(
        &self,
        resources: &Resources,
        mut builder: SnapshotBuilder,
        resolver: &SecretResolver<'_>,
    ) -> Result<SnapshotBuilder, ReconcilerError> {
        let mut first_seen: HashMap<&str, usize> = HashMap::with_capacity(resources.secrets.len());

        for (index, entry) in resources.secrets.iter().enumerate() {
            let namespace = entry.secret_ref.namespace_or(&self.owner.namespace);
            let location = || ResourceLocation {
                owner: self.owner.clone(),
                kind: ResourceKind::Secret,
                index,
                value: format!("{namespace}/{}", entry.secret_ref.name),
            };

            if let Some(first_index) = first_seen.insert(entry.name.as_str(), index) {
                return Err(ReconcilerError::DuplicateName {
                    location: location(),
                    name: entry.name.clone(),
                    first_index,
                });
            }

            let resource = resolver
                .resolve(&entry.name, namespace, &entry.secret_ref.name)
                .await
                .map_err(|source| ReconcilerError::Secret {
                    location: location(),
                    source,
                })?;

            builder
                .insert(entry.name.as_str(), resource)
                .map_err(|duplicate| ReconcilerError::DuplicateName {
                    location: location(),
                    first_index: first_index_of(
                        resources.secrets.iter().map(|e| e.name.as_str()),
                        &duplicate.name,
                        index,
                    ),
                    name: duplicate.name,
                })?;
        }

        debug!(count = resources.secrets.len(), "Resolved secrets");
        Ok(builder)
    }
}

/// Index of the first entry named `name`, falling back to `current`
fn first_index_of<'n>(names: impl Iterator<Item = &'n str>, name: &str, current: usize) -> usize {
    names.take(current).position(|n| n == name).unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_index_of_finds_earliest_entry() {
        let names = ["a", "b", "a", "a"];
        assert_eq!(first_index_of(names.into_iter(), "a", 3), 0);
        assert_eq!(first_index_of(names.into_iter(), "b", 3), 1);
        assert_eq!(first_index_of(names.into_iter(), "c", 2), 2);
    }
}
