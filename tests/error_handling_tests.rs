//! # Error Handling Tests
//!
//! These tests verify:
//! - Error classification (transient vs permanent) and reasons
//! - Field-level validation error rendering
//! - Status updates derived from outcomes
//! - Backoff progression used by the error policy

mod common;

use common::*;
use pretty_assertions::assert_eq;
use std::time::Duration;
use xds_snapshot_controller::controller::backoff::FibonacciBackoff;
use xds_snapshot_controller::controller::reconciler::{
    reconcile_node, BackoffState, ErrorClass, ReconcilerError, StatusUpdate, ValidationError,
};
use xds_snapshot_controller::crd::{NodeConfigCache, NodeConfigCacheStatus, Phase};
use xds_snapshot_controller::snapshot::{PublishPolicy, Snapshot};

async fn failure(spec: xds_snapshot_controller::crd::NodeConfigCacheSpec) -> ReconcilerError {
    reconcile_node(
        &owner(),
        &spec,
        &StaticSecretSource::new(),
        &RecordingStore::new(),
        PublishPolicy::default(),
    )
    .await
    .unwrap_err()
}

fn cache_object(status: Option<NodeConfigCacheStatus>) -> NodeConfigCache {
    let mut obj = NodeConfigCache::new(OWNER_NAME, scenario_a_spec());
    obj.metadata.namespace = Some(OWNER_NAMESPACE.to_string());
    obj.metadata.generation = Some(4);
    obj.status = status;
    obj
}

#[tokio::test]
async fn test_decode_error_renders_as_invalid_field() {
    let mut spec = spec("node-a", "1");
    spec.resources.clusters.push(entry("cluster-a", CLUSTER_A));
    spec.resources.clusters.push(entry("cluster-b", "{\"name\": 7}"));

    let err = failure(spec).await;
    assert_eq!(err.class(), ErrorClass::Permanent);
    assert_eq!(err.reason(), "SchemaViolation");

    let invalid = err.validation_error().unwrap();
    assert_eq!(invalid.group, "caches.xds-snapshot.io");
    assert_eq!(invalid.kind, "NodeConfigCache");
    assert_eq!(invalid.object, format!("{OWNER_NAMESPACE}/{OWNER_NAME}"));
    assert_eq!(invalid.field, "spec.resources.clusters[1].value");
    assert_eq!(invalid.value, "{\"name\": 7}");

    let rendered = invalid.to_string();
    assert!(
        rendered.starts_with(
            "NodeConfigCache.caches.xds-snapshot.io \"ns1/cache-a\" is invalid: spec.resources.clusters[1].value: Invalid value: "
        ),
        "{rendered}"
    );
    assert!(rendered.contains("schema violation for Cluster"), "{rendered}");
}

#[test]
fn test_long_values_are_truncated_when_rendered() {
    let invalid = ValidationError {
        group: "caches.xds-snapshot.io".to_string(),
        kind: "NodeConfigCache".to_string(),
        object: "ns1/cache-a".to_string(),
        field: "spec.resources.listeners[0].value".to_string(),
        value: "x".repeat(200),
        message: "schema violation".to_string(),
    };
    let rendered = invalid.to_string();
    assert!(rendered.contains(&format!("\"{}...\"", "x".repeat(80))), "{rendered}");
    assert!(!rendered.contains(&"x".repeat(81)));
}

#[tokio::test]
async fn test_secret_errors_point_at_secret_ref() {
    let mut spec = spec("node-a", "1");
    spec.resources.secrets.push(secret_entry("s1", Some("ns9"), "k1"));

    let err = failure(spec).await;

    assert_eq!(err.reason(), "SecretNotFound");
    assert!(err.is_transient());
    let invalid = err.validation_error().unwrap();
    assert_eq!(invalid.field, "spec.resources.secrets[0].ref");
    assert_eq!(invalid.value, "ns9/k1");
}

#[tokio::test]
async fn test_conversion_and_encoding_reasons() {
    let mut yaml = spec("node-a", "1");
    yaml.format = xds_snapshot_controller::envoy::Format::HumanReadable;
    yaml.resources.routes.push(entry("r", "name: [r"));
    assert_eq!(failure(yaml).await.reason(), "FormatConversionFailed");

    let mut b64 = spec("node-a", "1");
    b64.format = xds_snapshot_controller::envoy::Format::EncodedStructured;
    b64.resources.routes.push(entry("r", "***"));
    assert_eq!(failure(b64).await.reason(), "InvalidEncoding");
}

#[tokio::test]
async fn test_failed_status_keeps_last_published_version() {
    let previous = NodeConfigCacheStatus {
        phase: Some("Ready".to_string()),
        description: Some("Snapshot version 1 published for node node-a".to_string()),
        published_version: Some("1".to_string()),
        resources_published: Some(1),
        ..Default::default()
    };
    let obj = cache_object(Some(previous));

    let mut spec = scenario_a_spec();
    spec.resources.listeners.push(entry("l", "{\"name\": \"l\"}"));
    let err = failure(spec).await;
    let update = StatusUpdate::failed(&err);

    assert_eq!(update.phase, Phase::Failed);
    assert_eq!(update.reason, "SchemaViolation");
    assert!(!update.is_unchanged(obj.status.as_ref()));

    let status = update.to_status(&obj);
    assert_eq!(status.phase.as_deref(), Some("Failed"));
    assert_eq!(status.published_version.as_deref(), Some("1"));
    assert_eq!(status.resources_published, Some(1));
    assert_eq!(status.observed_generation, Some(4));
    assert_eq!(status.conditions.len(), 1);
    assert_eq!(status.conditions[0].status, "False");
    assert!(status.description.unwrap().contains("spec.resources.listeners[0].value"));
}

#[test]
fn test_ready_status_is_not_rewritten() {
    let snapshot = Snapshot::builder("node-a", "1").build();
    let update = StatusUpdate::ready(&snapshot);
    let obj = cache_object(None);
    assert!(!update.is_unchanged(obj.status.as_ref()));

    let written = update.to_status(&obj);
    assert_eq!(written.published_version.as_deref(), Some("1"));
    assert_eq!(written.conditions[0].reason.as_deref(), Some("SnapshotPublished"));

    // The next pass sees its own status and skips the patch
    assert!(update.is_unchanged(Some(&written)));
}

#[test]
fn test_backoff_state_tracks_error_streak() {
    let mut state = BackoffState::new(Duration::from_secs(1), Duration::from_secs(300));
    let delays: Vec<Duration> = (0..5)
        .map(|_| {
            state.increment_error();
            state.backoff.next_backoff()
        })
        .collect();

    assert_eq!(state.error_count, 5);
    assert_eq!(
        delays,
        [1, 1, 2, 3, 5].map(Duration::from_secs).to_vec()
    );

    state.reset();
    assert_eq!(state.error_count, 0);
    assert_eq!(state.backoff.next_backoff(), Duration::from_secs(1));
}

#[test]
fn test_backoff_never_exceeds_configured_max() {
    let mut backoff = FibonacciBackoff::new(Duration::from_millis(1000), Duration::from_millis(300_000));
    let delays: Vec<Duration> = (0..50).map(|_| backoff.next_backoff()).collect();
    assert!(delays.iter().all(|delay| *delay <= Duration::from_secs(300)));
    assert_eq!(delays.last(), Some(&Duration::from_secs(300)));
}
