//! # Watch Loop
//!
//! Drives kube-runtime's `Controller` over NodeConfigCache objects and keeps
//! it alive across stream failures.
//!
//! kube-runtime serializes reconciliations of the same object, so two passes
//! for one NodeConfigCache never publish concurrently.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::NodeConfigCache;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Watch NodeConfigCache objects and reconcile each change
///
/// Restarts the watch whenever the stream ends, until a shutdown signal
/// marks the server as not ready.
pub async fn run_watch_loop(
    caches: Api<NodeConfigCache>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: ControllerConfig,
) -> Result<(), anyhow::Error> {
    info!("Watching NodeConfigCache objects");

    let backoff_duration_ms = Arc::new(AtomicU64::new(config.backoff_start_ms));

    // Mark the server as not ready on SIGINT/SIGTERM so probes fail during drain
    let shutdown_server_state = server_state.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown_server_state.set_ready(false);
        info!("Shutdown signal received; readiness withdrawn, draining reconciliations");
    });

    loop {
        if !server_state.is_ready() {
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop",
            concurrency = config.max_concurrent_reconciliations
        );
        let stream_backoff = backoff_duration_ms.clone();
        let backoff_start_ms = config.backoff_start_ms;
        let backoff_max_ms = config.backoff_max_ms;
        let watch_restart_delay = config.watch_restart_delay_duration();

        let controller_future =
            Controller::new(caches.clone(), watcher::Config::default().any_semantic())
                .with_config(
                    controller::Config::default().concurrency(config.max_concurrent_reconciliations),
                )
                .shutdown_on_signal()
                .run(reconcile, handle_reconciliation_error, reconciler.clone())
                .filter_map(move |x| {
                    let backoff = stream_backoff.clone();
                    async move {
                        match &x {
                            Ok((object, _action)) => {
                                backoff.store(backoff_start_ms, Ordering::Relaxed);
                                debug!(object = %object, "watch.event.reconciled");
                                Some(x)
                            }
                            Err(e) => {
                                handle_watch_stream_error(
                                    &format!("{e:?}"),
                                    &backoff,
                                    backoff_max_ms,
                                    watch_restart_delay,
                                )
                                .await
                                .map(|()| x)
                            }
                        }
                    }
                })
                .for_each(|_| futures::future::ready(()));

        controller_future.instrument(watch_span).await;

        if !server_state.is_ready() {
            break;
        }

        let delay = config.watch_restart_delay_after_end_duration();
        warn!(restart_in_secs = delay.as_secs(), "watch.stream.ended");
        tokio::time::sleep(delay).await;
    }

    info!("Watch loop stopped after shutdown");
    Ok(())
}
