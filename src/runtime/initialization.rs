//! # Initialization
//!
//! Brings the process up in a fixed order: TLS provider, configuration,
//! logging and metrics first, then the HTTP server, and only then the
//! Kubernetes client. Probes answer before the API server is contacted.

use crate::config::ControllerConfig;
use crate::constants::{DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS};
use crate::controller::reconciler::{KubeSecretSource, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::crd::NodeConfigCache;
use crate::observability;
use crate::snapshot::InMemorySnapshotCache;
use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// API for the NodeConfigCache CRD, scoped to the watched namespace
    pub caches: Api<NodeConfigCache>,
    /// Shared context handed to every reconciliation
    pub reconciler: Arc<Reconciler>,
    /// Readiness flag and snapshot view served over HTTP
    pub server_state: Arc<ServerState>,
    /// Snapshot cache shared with the discovery server
    pub snapshots: Arc<InMemorySnapshotCache>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Build everything the watch loop needs
///
/// Fails when the HTTP server cannot bind, the cluster is unreachable, or
/// the NodeConfigCache CRD is not installed.
pub async fn initialize() -> Result<InitializationResult> {
    // kube's rustls backend needs a process-wide provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = ControllerConfig::from_env();

    observability::logging::init_logging(&config.log_level, config.log_format)
        .context("Failed to initialize logging")?;

    info!(
        build.timestamp = env!("BUILD_TIMESTAMP"),
        build.datetime = env!("BUILD_DATETIME"),
        build.git_hash = env!("BUILD_GIT_HASH"),
        "xDS snapshot controller starting"
    );

    observability::metrics::register_metrics()?;

    let snapshots = Arc::new(InMemorySnapshotCache::new());
    let server_state = Arc::new(ServerState::new(snapshots.clone()));

    let server_handle = tokio::spawn({
        let state = server_state.clone();
        let port = config.metrics_port;
        async move {
            if let Err(e) = start_server(port, state).await {
                error!(port, "HTTP server exited: {e:#}");
            }
        }
    });

    wait_for_server_ready(&server_state, &server_handle).await?;

    let client = Client::try_default()
        .await
        .context("Cannot build a Kubernetes client from the environment")?;

    let caches: Api<NodeConfigCache> = match &config.watch_namespace {
        Some(namespace) => {
            info!("Watching NodeConfigCache resources in namespace '{}'", namespace);
            Api::namespaced(client.clone(), namespace)
        }
        None => {
            info!("Watching NodeConfigCache resources in all namespaces");
            Api::all(client.clone())
        }
    };

    log_existing_resources(&caches).await?;

    let reconciler = Arc::new(Reconciler::new(
        client.clone(),
        snapshots.clone(),
        Arc::new(KubeSecretSource::new(client.clone())),
        config.clone(),
    ));

    info!("Initialization complete");

    Ok(InitializationResult {
        client,
        caches,
        reconciler,
        server_state,
        snapshots,
        config,
    })
}

/// Poll until the server reports ready, it exits, or the startup timeout passes
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
) -> Result<()> {
    let startup_timeout = Duration::from_secs(DEFAULT_SERVER_STARTUP_TIMEOUT_SECS);
    let poll_interval = Duration::from_millis(DEFAULT_SERVER_POLL_INTERVAL_MS);
    let deadline = Instant::now() + startup_timeout;

    loop {
        if server_handle.is_finished() {
            anyhow::bail!("HTTP server task exited during startup");
        }
        if server_state.is_ready() {
            return Ok(());
        }
        if Instant::now() > deadline {
            anyhow::bail!(
                "HTTP server not ready after {}s",
                startup_timeout.as_secs()
            );
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Fail fast when the CRD is not installed, and log what is already there
///
/// Existing objects are reconciled by the initial list of the watch.
async fn log_existing_resources(caches: &Api<NodeConfigCache>) -> Result<()> {
    let list = caches
        .list(&ListParams::default())
        .await
        .context("NodeConfigCache CRD is not queryable; is it installed?")?;

    info!(count = list.items.len(), "Existing NodeConfigCache objects");

    let mut by_namespace: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in &list.items {
        by_namespace
            .entry(item.metadata.namespace.clone().unwrap_or_default())
            .or_default()
            .push(format!(
                "{} (node {})",
                item.metadata.name.as_deref().unwrap_or("unknown"),
                item.spec.node_id
            ));
    }
    for (namespace, names) in &by_namespace {
        info!(namespace = namespace.as_str(), "{}", names.join(", "));
    }

    Ok(())
}
