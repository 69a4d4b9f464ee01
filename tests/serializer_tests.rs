//! # Serializer Tests
//!
//! Verifies that the three formats are interchangeable:
//! - Every kind survives encode/decode in every format
//! - Cosmetic differences (field order, whitespace, YAML style) decode equal
//! - Conversion, encoding and schema failures stay distinguishable

mod common;

use common::{CLUSTER_A, ENDPOINT_A, LISTENER_A, ROUTE_A, RUNTIME_A};
use pretty_assertions::assert_eq;
use rstest::rstest;
use xds_snapshot_controller::envoy::{DecodeError, Format, Resource, ResourceKind};
use xds_snapshot_controller::snapshot::{snapshots_equal, Snapshot};

const SECRET_A: &str = r#"{"name": "s1", "tls_certificate": {"certificate_chain": {"inline_bytes": "Y2VydA=="}, "private_key": {"inline_bytes": "a2V5"}}}"#;

fn structured(value: &str, kind: ResourceKind) -> Resource {
    Format::Structured.decode(value, kind).unwrap()
}

#[rstest]
#[case::endpoint(ResourceKind::Endpoint, ENDPOINT_A)]
#[case::cluster(ResourceKind::Cluster, CLUSTER_A)]
#[case::route(ResourceKind::Route, ROUTE_A)]
#[case::listener(ResourceKind::Listener, LISTENER_A)]
#[case::secret(ResourceKind::Secret, SECRET_A)]
#[case::runtime(ResourceKind::Runtime, RUNTIME_A)]
fn test_every_format_decodes_to_the_same_resource(#[case] kind: ResourceKind, #[case] value: &str) {
    let original = structured(value, kind);
    assert_eq!(original.kind(), kind);

    for format in Format::ALL {
        let encoded = format.encode(&original).unwrap();
        let decoded = format.decode(&encoded, kind).unwrap();
        assert_eq!(decoded, original, "{kind} through {format}");
    }
}

#[test]
fn test_handwritten_yaml_matches_json() {
    let yaml = r"
# comments and block style are fine
lb_policy: ROUND_ROBIN
type: STRICT_DNS
name: cluster-a
connect_timeout: 0.250s
";
    let from_yaml = Format::HumanReadable.decode(yaml, ResourceKind::Cluster).unwrap();
    assert_eq!(from_yaml, structured(CLUSTER_A, ResourceKind::Cluster));
}

#[test]
fn test_field_order_and_whitespace_do_not_matter() {
    let reordered = r#"
        {
            "lb_policy" : "ROUND_ROBIN",
            "connect_timeout" : "0.25s",
            "type" : "STRICT_DNS",
            "name" : "cluster-a"
        }"#;
    let a = structured(CLUSTER_A, ResourceKind::Cluster);
    let b = structured(reordered, ResourceKind::Cluster);
    assert_eq!(a, b);

    let first = Snapshot::builder("node-a", "1").with("cluster-a", a).unwrap().build();
    let second = Snapshot::builder("node-a", "1").with("cluster-a", b).unwrap().build();
    assert!(snapshots_equal(&first, &second));
}

#[rstest]
#[case::cluster(
    ResourceKind::Cluster,
    CLUSTER_A,
    r#"{"name": "cluster-a", "connectTimeout": "0.25s", "type": "STRICT_DNS", "lbPolicy": "ROUND_ROBIN"}"#
)]
#[case::endpoint(
    ResourceKind::Endpoint,
    ENDPOINT_A,
    r#"{"clusterName": "cluster-a", "endpoints": [{"lbEndpoints": [{"endpoint": {"address": {"socketAddress": {"address": "10.0.0.1", "portValue": 8080}}}}]}]}"#
)]
#[case::route(
    ResourceKind::Route,
    ROUTE_A,
    r#"{"name": "local_route", "virtualHosts": [{"name": "backend", "domains": ["*"], "routes": [{"match": {"prefix": "/"}, "route": {"cluster": "cluster-a"}}]}]}"#
)]
#[case::secret(
    ResourceKind::Secret,
    SECRET_A,
    r#"{"name": "s1", "tlsCertificate": {"certificateChain": {"inlineBytes": "Y2VydA=="}, "privateKey": {"inlineBytes": "a2V5"}}}"#
)]
fn test_json_names_decode_like_proto_names(
    #[case] kind: ResourceKind,
    #[case] proto_names: &str,
    #[case] json_names: &str,
) {
    assert_eq!(structured(json_names, kind), structured(proto_names, kind));
}

#[test]
fn test_runtime_numbers_are_compared_as_doubles() {
    let integer = structured(r#"{"name": "rtds-0", "layer": {"k": 1}}"#, ResourceKind::Runtime);
    let double = structured(r#"{"name": "rtds-0", "layer": {"k": 1.0}}"#, ResourceKind::Runtime);
    assert_eq!(integer, double);

    let first = Snapshot::builder("node-a", "1").with("rtds-0", integer).unwrap().build();
    let second = Snapshot::builder("node-a", "1").with("rtds-0", double).unwrap().build();
    assert!(snapshots_equal(&first, &second));

    let changed = structured(r#"{"name": "rtds-0", "layer": {"k": 2}}"#, ResourceKind::Runtime);
    let third = Snapshot::builder("node-a", "1").with("rtds-0", changed).unwrap().build();
    assert!(!snapshots_equal(&first, &third));
}

#[test]
fn test_endpoint_metadata_numbers_are_compared_as_doubles() {
    let with_weight = |weight: &str| {
        structured(
            &format!(
                r#"{{"cluster_name": "c", "endpoints": [{{"lb_endpoints": [{{"metadata": {{"filter_metadata": {{"envoy.lb": {{"weight": {weight}}}}}}}}}]}}]}}"#
            ),
            ResourceKind::Endpoint,
        )
    };
    assert_eq!(with_weight("3"), with_weight("3.0"));
    assert_ne!(with_weight("3"), with_weight("4"));
}

#[test]
fn test_default_scalars_equal_absent_fields() {
    // ROUND_ROBIN is the proto3 default, so it is the same as leaving it out
    let explicit = structured(CLUSTER_A, ResourceKind::Cluster);
    let implicit = structured(
        r#"{"name": "cluster-a", "connect_timeout": "0.25s", "type": "STRICT_DNS"}"#,
        ResourceKind::Cluster,
    );
    assert_eq!(explicit, implicit);
}

#[test]
fn test_content_change_is_detected() {
    let a = structured(CLUSTER_A, ResourceKind::Cluster);
    let b = structured(
        r#"{"name": "cluster-a", "connect_timeout": "0.5s", "type": "STRICT_DNS"}"#,
        ResourceKind::Cluster,
    );
    assert_ne!(a, b);
}

#[test]
fn test_schema_error_names_kind_and_field() {
    let err = Format::Structured
        .decode(r#"{"name": "cluster-a", "connect_timeot": "1s"}"#, ResourceKind::Cluster)
        .unwrap_err();
    match err {
        DecodeError::Schema { kind, field, .. } => {
            assert_eq!(kind, ResourceKind::Cluster);
            assert_eq!(field.as_deref(), Some("connect_timeot"));
        }
        other => panic!("expected schema violation, got {other:?}"),
    }
}

#[test]
fn test_nested_validation_reports_field_path() {
    let err = Format::Structured
        .decode(
            r#"{"name": "r", "virtual_hosts": [{"name": "vh", "domains": ["*"], "routes": [{"match": {"prefix": "/"}}]}]}"#,
            ResourceKind::Route,
        )
        .unwrap_err();
    let DecodeError::Schema { field: Some(field), .. } = err else {
        panic!("expected schema violation with a field, got {err:?}");
    };
    assert!(field.starts_with("virtual_hosts[0].routes[0]"), "{field}");
}

#[rstest]
#[case::yaml_syntax(Format::HumanReadable, "name: [cluster-a", "format conversion failed")]
#[case::yaml_schema(Format::HumanReadable, "name: cluster-a\nbogus: true\n", "schema violation")]
#[case::base64(Format::EncodedStructured, "%%%not-base64%%%", "invalid encoding")]
#[case::base64_schema(Format::EncodedStructured, "eyJib2d1cyI6IDF9", "schema violation")]
#[case::json_syntax(Format::Structured, "{\"name\": ", "schema violation")]
fn test_failures_are_reported_distinctly(
    #[case] format: Format,
    #[case] input: &str,
    #[case] expected_prefix: &str,
) {
    let err = format.decode(input, ResourceKind::Cluster).unwrap_err();
    let message = err.to_string();
    assert!(
        message.starts_with(expected_prefix),
        "{format}: expected '{expected_prefix}', got '{message}'"
    );
}

#[test]
fn test_format_is_never_guessed() {
    // Valid YAML, but the spec declared structured text
    let err = Format::Structured
        .decode("name: cluster-a\n", ResourceKind::Cluster)
        .unwrap_err();
    assert!(matches!(err, DecodeError::Schema { .. }));
}
