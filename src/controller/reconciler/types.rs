//! # Types
//!
//! Shared reconciler context.

use super::secrets::SecretSource;
use super::error::ObjectKey;
use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::snapshot::SnapshotStore;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backoff state for a specific resource
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min, max),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Context handed to every reconciliation
#[derive(Clone)]
pub struct Reconciler {
    pub client: Client,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub secrets: Arc<dyn SecretSource>,
    pub config: ControllerConfig,
    // Keyed by namespace/name; owned by the error policy
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        client: Client,
        snapshots: Arc<dyn SnapshotStore>,
        secrets: Arc<dyn SecretSource>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            client,
            snapshots,
            secrets,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Forget the error streak of `key` after a successful pass
    pub fn reset_backoff(&self, key: &ObjectKey) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(&key.to_string());
        }
    }

    /// Record a transient failure of `key` and return the delay before retrying
    pub fn next_backoff(&self, key: &ObjectKey) -> (Duration, u32) {
        let min = self.config.backoff_start_duration();
        let max = self.config.backoff_max_duration();
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(key.to_string())
                    .or_insert_with(|| BackoffState::new(min, max));
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(_) => (max, 0),
        }
    }
}
