//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::reconciler::{ErrorClass, ObjectKey, Reconciler, ReconcilerError};
use crate::crd::NodeConfigCache;
use crate::observability;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Decide what happens after a failed reconciliation
///
/// Transient failures are retried with a per-object Fibonacci backoff.
/// Permanent failures wait for the object to change; retrying cannot fix them.
pub fn handle_reconciliation_error(
    obj: Arc<NodeConfigCache>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let key = ObjectKey::of(&obj);
    let class = error.class();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = key.name.as_str(),
        resource.namespace = key.namespace.as_str(),
        error.class = class.as_str(),
        error.reason = error.reason(),
    );
    let _error_guard = error_span.enter();

    observability::metrics::increment_reconciliation_errors(class.as_str(), error.reason());

    match class {
        ErrorClass::Permanent => {
            match error.validation_error() {
                Some(validation) => error!("{}", validation),
                None => error!("Reconciliation of {} failed: {}", key, error),
            }
            info!("Waiting for {} to change before retrying", key);
            Action::await_change()
        }
        ErrorClass::Transient => {
            warn!("Reconciliation of {} failed: {}", key, error);
            let (delay, error_count) = ctx.next_backoff(&key);
            let next_trigger_time = chrono::Utc::now()
                + chrono::Duration::milliseconds(i64::try_from(delay.as_millis()).unwrap_or(i64::MAX));
            info!(
                "Retrying with Fibonacci backoff: {}ms (error count: {}, next attempt at {})",
                delay.as_millis(),
                error_count,
                next_trigger_time.to_rfc3339()
            );
            observability::metrics::increment_requeues_total(error.reason());
            Action::requeue(delay)
        }
    }
}

/// Classification of a watch stream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    NotFound,
    Unauthorized,
    Expired,
    Throttled,
    Other,
}

impl WatchErrorKind {
    /// Classify a watch error from its debug rendering
    ///
    /// 404 is checked before 401: a plain-text 404 surfaces as a serde error
    /// mentioning `WatchFailed`.
    #[must_use]
    pub fn classify(error: &str) -> Self {
        let is_not_found =
            error.contains("ObjectNotFound") || error.contains("404") || error.contains("not found");
        if is_not_found {
            return WatchErrorKind::NotFound;
        }
        if error.contains("401") || error.contains("Unauthorized") {
            return WatchErrorKind::Unauthorized;
        }
        if error.contains("410")
            || error.contains("too old resource version")
            || error.contains("Expired")
            || error.contains("Gone")
        {
            return WatchErrorKind::Expired;
        }
        if error.contains("429")
            || error.contains("storage is (re)initializing")
            || error.contains("TooManyRequests")
        {
            return WatchErrorKind::Throttled;
        }
        WatchErrorKind::Other
    }
}

/// Handle watch stream errors with appropriate classification and backoff
///
/// Returns `None` to filter out the error (allow restart) or `Some(())` to continue.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff: &Arc<AtomicU64>,
    max_backoff_ms: u64,
    watch_restart_delay: Duration,
) -> Option<()> {
    let kind = WatchErrorKind::classify(error_string);
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string,
        error.kind = ?kind
    );
    let _error_guard = error_span.enter();

    match kind {
        WatchErrorKind::Unauthorized => {
            error!(
                "Watch authentication failed (401 Unauthorized): check the controller's ServiceAccount and its RBAC for nodeconfigcaches and secrets"
            );
            warn!(
                "Waiting {}s before retrying watch (RBAC may need time to propagate)...",
                watch_restart_delay.as_secs()
            );
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
        WatchErrorKind::Expired => {
            warn!("Watch resource version expired (410), watch will restart");
            None
        }
        WatchErrorKind::Throttled => {
            let current_backoff = backoff.load(Ordering::Relaxed);
            warn!(
                "API server storage reinitializing (429), backing off for {}ms before restart...",
                current_backoff
            );
            tokio::time::sleep(Duration::from_millis(current_backoff)).await;
            let new_backoff = current_backoff.saturating_mul(2).min(max_backoff_ms);
            backoff.store(new_backoff, Ordering::Relaxed);
            None
        }
        WatchErrorKind::NotFound => {
            warn!(
                "Resource not found (404), this is normal for deleted objects but may mean the NodeConfigCache CRD is missing: {}",
                error_string
            );
            Some(())
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error_string);
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
    }
}
