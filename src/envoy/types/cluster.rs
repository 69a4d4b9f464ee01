//! # Cluster Resources
//!
//! `envoy.api.v2.Cluster`. Sub-messages the controller never inspects
//! (health checks, circuit breakers, TLS contexts, protocol options) are kept
//! as JSON values so they still take part in structural equality.

use super::common::{is_default, Address, Metadata, ProtoDuration, TransportSocket};
use super::endpoint::ClusterLoadAssignment;
use super::SchemaViolation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Cluster {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty", alias = "altStatName")]
    pub alt_stat_name: String,
    #[serde(rename = "type", default, skip_serializing_if = "is_default")]
    pub discovery_type: DiscoveryType,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "edsClusterConfig")]
    pub eds_cluster_config: Option<EdsClusterConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "connectTimeout")]
    pub connect_timeout: Option<ProtoDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "perConnectionBufferLimitBytes")]
    pub per_connection_buffer_limit_bytes: Option<u32>,
    #[serde(default, skip_serializing_if = "is_default", alias = "lbPolicy")]
    pub lb_policy: LbPolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "loadAssignment")]
    pub load_assignment: Option<ClusterLoadAssignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "healthChecks")]
    pub health_checks: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "maxRequestsPerConnection")]
    pub max_requests_per_connection: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "circuitBreakers")]
    pub circuit_breakers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "tlsContext")]
    pub tls_context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "commonHttpProtocolOptions")]
    pub common_http_protocol_options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "httpProtocolOptions")]
    pub http_protocol_options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "http2ProtocolOptions")]
    pub http2_protocol_options: Option<Value>,
    #[serde(default, skip_serializing_if = "is_default", alias = "dnsLookupFamily")]
    pub dns_lookup_family: DnsLookupFamily,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "dnsRefreshRate")]
    pub dns_refresh_rate: Option<ProtoDuration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "dnsResolvers")]
    pub dns_resolvers: Vec<Address>,
    #[serde(default, skip_serializing_if = "is_default", alias = "respectDnsTtl")]
    pub respect_dns_ttl: bool,
    #[serde(default, skip_serializing_if = "is_default", alias = "useTcpForDnsLookups")]
    pub use_tcp_for_dns_lookups: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "outlierDetection")]
    pub outlier_detection: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "cleanupInterval")]
    pub cleanup_interval: Option<ProtoDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "commonLbConfig")]
    pub common_lb_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "upstreamConnectionOptions")]
    pub upstream_connection_options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "transportSocket")]
    pub transport_socket: Option<TransportSocket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Cluster {
    pub(crate) fn validate(&self) -> Result<(), SchemaViolation> {
        if self.name.is_empty() {
            return Err(SchemaViolation::new("name", "must not be empty"));
        }
        if self.discovery_type == DiscoveryType::Eds && !self.hosts.is_empty() {
            return Err(SchemaViolation::new(
                "hosts",
                "must be empty for EDS clusters, endpoints are discovered",
            ));
        }
        if let Some(assignment) = &self.load_assignment {
            assignment
                .validate()
                .map_err(|violation| violation.within("load_assignment"))?;
        }
        Ok(())
    }
}

/// Service discovery type of a cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum DiscoveryType {
    #[default]
    #[serde(rename = "STATIC")]
    Static,
    #[serde(rename = "STRICT_DNS")]
    StrictDns,
    #[serde(rename = "LOGICAL_DNS")]
    LogicalDns,
    #[serde(rename = "EDS")]
    Eds,
    #[serde(rename = "ORIGINAL_DST")]
    OriginalDst,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum LbPolicy {
    #[default]
    #[serde(rename = "ROUND_ROBIN")]
    RoundRobin,
    #[serde(rename = "LEAST_REQUEST")]
    LeastRequest,
    #[serde(rename = "RING_HASH")]
    RingHash,
    #[serde(rename = "RANDOM")]
    Random,
    #[serde(rename = "MAGLEV")]
    Maglev,
    #[serde(rename = "CLUSTER_PROVIDED")]
    ClusterProvided,
    #[serde(rename = "ORIGINAL_DST_LB")]
    OriginalDstLb,
    #[serde(rename = "LOAD_BALANCING_POLICY_CONFIG")]
    LoadBalancingPolicyConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum DnsLookupFamily {
    #[default]
    #[serde(rename = "AUTO")]
    Auto,
    #[serde(rename = "V4_ONLY")]
    V4Only,
    #[serde(rename = "V6_ONLY")]
    V6Only,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EdsClusterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "edsConfig")]
    pub eds_config: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty", alias = "serviceName")]
    pub service_name: String,
}
