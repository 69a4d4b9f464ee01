//! # Reconcile
//!
//! One reconciliation pass for a NodeConfigCache:
//!
//! ```text
//! Loading -> { Publishing | Skipped | Failed }
//! ```
//!
//! [`reconcile_node`] holds the decision logic and only talks to the
//! injected secret source and snapshot store. [`reconcile`] wraps it for
//! kube-runtime with tracing, metrics and status reporting.
//!
//! The store is written last and only with a fully assembled snapshot, so a
//! pass that fails or is cancelled leaves the published snapshot untouched.

use super::error::{ObjectKey, ReconcilerError};
use super::loader::ResourceLoader;
use super::secrets::{SecretResolver, SecretSource};
use super::status::{update_status, StatusUpdate};
use super::types::Reconciler;
use crate::crd::{NodeConfigCache, NodeConfigCacheSpec};
use crate::envoy::ResourceKind;
use crate::observability::metrics;
use crate::snapshot::{PublishPolicy, Snapshot, SnapshotDiff, SnapshotStore};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Terminal state of a successful pass
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// The candidate replaced the published snapshot
    Published {
        snapshot: Arc<Snapshot>,
        diff: SnapshotDiff,
    },
    /// The candidate matched what is published; nothing was written
    Skipped { snapshot: Arc<Snapshot> },
}

impl ReconcileOutcome {
    /// Snapshot served to the node after this pass
    #[must_use]
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        match self {
            ReconcileOutcome::Published { snapshot, .. } | ReconcileOutcome::Skipped { snapshot } => {
                snapshot
            }
        }
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        matches!(self, ReconcileOutcome::Published { .. })
    }
}

/// Load the spec and publish it for its node if it changed
///
/// No retries happen here; failures carry their class for the caller.
pub async fn reconcile_node(
    owner: &ObjectKey,
    spec: &NodeConfigCacheSpec,
    secrets: &dyn SecretSource,
    store: &dyn SnapshotStore,
    policy: PublishPolicy,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let node_id = spec.node_id.as_str();

    let loader = ResourceLoader::new(owner, spec.format.decoder());
    let resolver = SecretResolver::new(secrets);
    let candidate = loader.load(spec, &resolver).await?;

    let current = store
        .get_snapshot(node_id)
        .await
        .map_err(|source| ReconcilerError::StoreRead {
            node_id: node_id.to_string(),
            source,
        })?;

    if let Some(published) = &current {
        if !policy.should_publish(Some(published.as_ref()), &candidate) {
            debug!(
                node.id = node_id,
                version = published.version(),
                "Snapshot unchanged, skipping publish"
            );
            return Ok(ReconcileOutcome::Skipped {
                snapshot: Arc::clone(published),
            });
        }
    }

    let diff = SnapshotDiff::between(current.as_deref(), &candidate);
    let candidate = Arc::new(candidate);
    store
        .set_snapshot(node_id, Arc::clone(&candidate))
        .await
        .map_err(|source| ReconcilerError::StoreWrite {
            node_id: node_id.to_string(),
            source,
        })?;

    Ok(ReconcileOutcome::Published {
        snapshot: candidate,
        diff,
    })
}

/// kube-runtime entry point for one NodeConfigCache
///
/// Success waits for the next change of the object. Failures are returned
/// for the error policy to requeue or park.
pub async fn reconcile(
    obj: Arc<NodeConfigCache>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let key = ObjectKey::of(&obj);
    let span = info_span!(
        "controller.reconcile",
        resource.name = %key.name,
        resource.namespace = %key.namespace,
        node.id = %obj.spec.node_id,
        resource.generation = obj.metadata.generation.unwrap_or(0),
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations();

        let result = reconcile_node(
            &key,
            &obj.spec,
            ctx.secrets.as_ref(),
            ctx.snapshots.as_ref(),
            ctx.config.publish_policy(),
        )
        .await;

        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                let snapshot = outcome.snapshot();
                match &outcome {
                    ReconcileOutcome::Published { diff, .. } => {
                        info!(
                            version = snapshot.version(),
                            resources = snapshot.len(),
                            "Published snapshot ({diff})"
                        );
                        metrics::increment_snapshots_published();
                        for kind in ResourceKind::ALL {
                            metrics::set_published_resources(
                                kind,
                                snapshot.resources(kind).len(),
                            );
                        }
                    }
                    ReconcileOutcome::Skipped { .. } => {
                        metrics::increment_snapshots_skipped();
                    }
                }

                ctx.reset_backoff(&key);
                update_status(&ctx.client, &obj, &StatusUpdate::ready(snapshot))
                    .await
                    .map_err(|source| ReconcilerError::Status {
                        object: key.clone(),
                        source,
                    })?;
                Ok(Action::await_change())
            }
            Err(error) => {
                if let Err(status_error) =
                    update_status(&ctx.client, &obj, &StatusUpdate::failed(&error)).await
                {
                    warn!("Failed to record failure on status of {key}: {status_error}");
                }
                Err(error)
            }
        }
    }
    .instrument(span)
    .await
}
