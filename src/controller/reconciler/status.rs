//! # Status Updates
//!
//! Records the outcome of a pass on the NodeConfigCache status.

use super::error::ReconcilerError;
use crate::constants::FIELD_MANAGER;
use crate::crd::{Condition, NodeConfigCache, NodeConfigCacheStatus, Phase};
use crate::snapshot::Snapshot;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use tracing::debug;

/// What a pass wants written to status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub phase: Phase,
    pub description: String,
    pub reason: &'static str,
    /// Only known after a successful pass
    pub published: Option<(String, usize)>,
}

impl StatusUpdate {
    #[must_use]
    pub fn ready(snapshot: &Snapshot) -> Self {
        Self {
            phase: Phase::Ready,
            description: format!(
                "Snapshot version {} published for node {}",
                snapshot.version(),
                snapshot.node_id()
            ),
            reason: "SnapshotPublished",
            published: Some((snapshot.version().to_string(), snapshot.len())),
        }
    }

    #[must_use]
    pub fn failed(error: &ReconcilerError) -> Self {
        let description = error
            .validation_error()
            .map_or_else(|| error.to_string(), |invalid| invalid.to_string());
        Self {
            phase: Phase::Failed,
            description,
            reason: error.reason(),
            published: None,
        }
    }

    /// Whether `current` already shows this phase and description
    #[must_use]
    pub fn is_unchanged(&self, current: Option<&NodeConfigCacheStatus>) -> bool {
        let current_phase = current.and_then(|s| s.phase.as_deref());
        let current_description = current.and_then(|s| s.description.as_deref());
        current_phase == Some(self.phase.as_str())
            && current_description == Some(self.description.as_str())
    }

    /// Full status to write, carrying over what this update does not know
    #[must_use]
    pub fn to_status(&self, obj: &NodeConfigCache) -> NodeConfigCacheStatus {
        let now = chrono::Utc::now().to_rfc3339();
        let existing = obj.status.as_ref();
        let (published_version, resources_published) = match &self.published {
            Some((version, count)) => (
                Some(version.clone()),
                Some(i32::try_from(*count).unwrap_or(i32::MAX)),
            ),
            None => (
                existing.and_then(|s| s.published_version.clone()),
                existing.and_then(|s| s.resources_published),
            ),
        };

        NodeConfigCacheStatus {
            phase: Some(self.phase.as_str().to_string()),
            description: Some(self.description.clone()),
            conditions: vec![Condition {
                r#type: "Ready".to_string(),
                status: if self.phase == Phase::Ready { "True" } else { "False" }.to_string(),
                last_transition_time: Some(now.clone()),
                reason: Some(self.reason.to_string()),
                message: Some(self.description.clone()),
            }],
            observed_generation: obj.metadata.generation,
            published_version,
            last_reconcile_time: Some(now),
            resources_published,
        }
    }
}

/// Patch status if phase or description changed
///
/// Unchanged status is not written, so repeated passes do not generate
/// watch events that would trigger yet another pass.
pub async fn update_status(
    client: &Client,
    obj: &NodeConfigCache,
    update: &StatusUpdate,
) -> Result<(), kube::Error> {
    if update.is_unchanged(obj.status.as_ref()) {
        debug!(
            phase = update.phase.as_str(),
            "Skipping status update - phase and description unchanged"
        );
        return Ok(());
    }

    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<NodeConfigCache> = Api::namespaced(client.clone(), &namespace);
    let patch = serde_json::json!({ "status": update.to_status(obj) });

    api.patch_status(
        &obj.name_any(),
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(patch),
    )
    .await?;

    Ok(())
}
