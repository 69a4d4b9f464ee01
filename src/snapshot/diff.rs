//! # Snapshot Comparison
//!
//! Decides whether a freshly assembled snapshot needs publishing.
//!
//! Equality is content-only: the `version` string is ignored, so bumping the
//! version without changing any resource does not push new configuration to
//! the fleet. Deployments that key distribution on the version can opt into
//! [`PublishPolicy::ContentOrVersionChange`].

use super::Snapshot;
use crate::envoy::ResourceKind;
use std::fmt;

/// Whether two snapshots carry the same resources
///
/// Resource names must match exactly per kind and every pair of resources
/// must be structurally equal. The node ID and version are not compared.
#[must_use]
pub fn snapshots_equal(a: &Snapshot, b: &Snapshot) -> bool {
    ResourceKind::ALL
        .into_iter()
        .all(|kind| a.resources(kind) == b.resources(kind))
}

/// When a candidate snapshot replaces the published one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishPolicy {
    /// Publish only when resource content differs
    #[default]
    ContentChange,
    /// Also publish when only the version string changed
    ContentOrVersionChange,
}

impl PublishPolicy {
    /// Decide publication against the currently published snapshot
    ///
    /// Nothing published yet always means publish, even for an empty
    /// candidate, so that the node gets an explicit (empty) configuration.
    #[must_use]
    pub fn should_publish(self, current: Option<&Snapshot>, candidate: &Snapshot) -> bool {
        let Some(current) = current else {
            return true;
        };
        if !snapshots_equal(current, candidate) {
            return true;
        }
        match self {
            PublishPolicy::ContentChange => false,
            PublishPolicy::ContentOrVersionChange => current.version() != candidate.version(),
        }
    }
}

/// Resource-level differences between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub added: Vec<(ResourceKind, String)>,
    pub removed: Vec<(ResourceKind, String)>,
    pub changed: Vec<(ResourceKind, String)>,
}

impl SnapshotDiff {
    /// Compare `new` against `old`; a missing `old` counts as empty
    #[must_use]
    pub fn between(old: Option<&Snapshot>, new: &Snapshot) -> Self {
        let mut diff = SnapshotDiff::default();
        for kind in ResourceKind::ALL {
            let after = new.resources(kind);
            match old.map(|old| old.resources(kind)) {
                None => {
                    diff.added
                        .extend(after.keys().map(|name| (kind, name.clone())));
                }
                Some(before) => {
                    for (name, resource) in after {
                        match before.get(name) {
                            None => diff.added.push((kind, name.clone())),
                            Some(previous) if previous != resource => {
                                diff.changed.push((kind, name.clone()));
                            }
                            Some(_) => {}
                        }
                    }
                    diff.removed.extend(
                        before
                            .keys()
                            .filter(|name| !after.contains_key(*name))
                            .map(|name| (kind, name.clone())),
                    );
                }
            }
        }
        diff
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl fmt::Display for SnapshotDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} removed, {} changed",
            self.added.len(),
            self.removed.len(),
            self.changed.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envoy::{Format, Resource};

    fn cluster(json: &str) -> Resource {
        Format::Structured.decode(json, ResourceKind::Cluster).unwrap()
    }

    fn snapshot(version: &str, clusters: &[(&str, &str)]) -> Snapshot {
        let mut builder = Snapshot::builder("node-a", version);
        for (name, json) in clusters {
            builder.insert(*name, cluster(json)).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_version_is_ignored_by_equality() {
        let a = snapshot("1", &[("c", r#"{"name":"c"}"#)]);
        let b = snapshot("2", &[("c", r#"{"name":"c"}"#)]);
        assert!(snapshots_equal(&a, &b));
    }

    #[test]
    fn test_formatting_is_ignored_by_equality() {
        let a = snapshot(
            "1",
            &[("c", r#"{"name":"c","connect_timeout":"1s","lb_policy":"RANDOM"}"#)],
        );
        let b = snapshot(
            "1",
            &[("c", "{\n  \"lb_policy\": \"RANDOM\",\n  \"connect_timeout\": \"1.000s\",\n  \"name\": \"c\"\n}")],
        );
        assert!(snapshots_equal(&a, &b));
    }

    #[test]
    fn test_name_set_difference_breaks_equality() {
        let a = snapshot("1", &[("c", r#"{"name":"c"}"#)]);
        let b = snapshot("1", &[("d", r#"{"name":"c"}"#)]);
        assert!(!snapshots_equal(&a, &b));
    }

    #[test]
    fn test_policy_decisions() {
        let v1 = snapshot("1", &[("c", r#"{"name":"c"}"#)]);
        let v2 = snapshot("2", &[("c", r#"{"name":"c"}"#)]);

        assert!(PublishPolicy::ContentChange.should_publish(None, &v1));
        assert!(!PublishPolicy::ContentChange.should_publish(Some(&v1), &v2));
        assert!(PublishPolicy::ContentOrVersionChange.should_publish(Some(&v1), &v2));
        assert!(!PublishPolicy::ContentOrVersionChange.should_publish(Some(&v1), &v1));
    }

    #[test]
    fn test_diff_lists_added_removed_changed() {
        let old = snapshot("1", &[("a", r#"{"name":"a"}"#), ("b", r#"{"name":"b"}"#)]);
        let new = snapshot(
            "2",
            &[("a", r#"{"name":"a","lb_policy":"MAGLEV"}"#), ("c", r#"{"name":"c"}"#)],
        );
        let diff = SnapshotDiff::between(Some(&old), &new);
        assert_eq!(diff.added, vec![(ResourceKind::Cluster, "c".to_string())]);
        assert_eq!(diff.removed, vec![(ResourceKind::Cluster, "b".to_string())]);
        assert_eq!(diff.changed, vec![(ResourceKind::Cluster, "a".to_string())]);
        assert_eq!(diff.to_string(), "1 added, 1 removed, 1 changed");

        let initial = SnapshotDiff::between(None, &new);
        assert_eq!(initial.added.len(), 2);
        assert!(SnapshotDiff::between(Some(&new), &new).is_empty());
    }
}
