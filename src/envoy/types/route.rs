//! # Route Resources
//!
//! `envoy.api.v2.RouteConfiguration` with its virtual hosts and routes.

use super::common::{is_default, DataSource, Metadata, ProtoDuration};
use super::SchemaViolation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfiguration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "virtualHosts")]
    pub virtual_hosts: Vec<VirtualHost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vhds: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "internalOnlyHeaders")]
    pub internal_only_headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "responseHeadersToAdd")]
    pub response_headers_to_add: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "responseHeadersToRemove")]
    pub response_headers_to_remove: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "requestHeadersToAdd")]
    pub request_headers_to_add: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "requestHeadersToRemove")]
    pub request_headers_to_remove: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "validateClusters")]
    pub validate_clusters: Option<bool>,
}

impl RouteConfiguration {
    pub(crate) fn validate(&self) -> Result<(), SchemaViolation> {
        for (host_idx, host) in self.virtual_hosts.iter().enumerate() {
            let host_path = format!("virtual_hosts[{host_idx}]");
            if host.name.is_empty() {
                return Err(SchemaViolation::new("name", "must not be empty").within(&host_path));
            }
            if host.domains.is_empty() {
                return Err(
                    SchemaViolation::new("domains", "must contain at least one domain")
                        .within(&host_path),
                );
            }
            for (route_idx, route) in host.routes.iter().enumerate() {
                route
                    .validate()
                    .map_err(|violation| {
                        violation
                            .within(&format!("routes[{route_idx}]"))
                            .within(&host_path)
                    })?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum TlsRequirementType {
    #[default]
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "EXTERNAL_ONLY")]
    ExternalOnly,
    #[serde(rename = "ALL")]
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualHost {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "is_default", alias = "requireTls")]
    pub require_tls: TlsRequirementType,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "virtualClusters")]
    pub virtual_clusters: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "rateLimits")]
    pub rate_limits: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "requestHeadersToAdd")]
    pub request_headers_to_add: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "requestHeadersToRemove")]
    pub request_headers_to_remove: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "responseHeadersToAdd")]
    pub response_headers_to_add: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "responseHeadersToRemove")]
    pub response_headers_to_remove: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", alias = "typedPerFilterConfig")]
    pub typed_per_filter_config: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "retryPolicy")]
    pub retry_policy: Option<Value>,
    #[serde(default, skip_serializing_if = "is_default", alias = "includeRequestAttemptCount")]
    pub include_request_attempt_count: bool,
}

/// A single route entry
///
/// Exactly one of `route`, `redirect` or `direct_response` must be set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "match")]
    pub route_match: RouteMatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "directResponse")]
    pub direct_response: Option<DirectResponseAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorator: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", alias = "typedPerFilterConfig")]
    pub typed_per_filter_config: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "requestHeadersToAdd")]
    pub request_headers_to_add: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "requestHeadersToRemove")]
    pub request_headers_to_remove: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "responseHeadersToAdd")]
    pub response_headers_to_add: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "responseHeadersToRemove")]
    pub response_headers_to_remove: Vec<String>,
}

impl Route {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let actions = [
            self.route.is_some(),
            self.redirect.is_some(),
            self.direct_response.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();

        match actions {
            1 => {}
            0 => {
                return Err(SchemaViolation::new(
                    "action",
                    "one of route, redirect or direct_response is required",
                ))
            }
            _ => {
                return Err(SchemaViolation::new(
                    "action",
                    "only one of route, redirect or direct_response may be set",
                ))
            }
        }

        let specifiers = [
            self.route_match.prefix.is_some(),
            self.route_match.path.is_some(),
            self.route_match.regex.is_some(),
            self.route_match.safe_regex.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if specifiers != 1 {
            return Err(SchemaViolation::new(
                "match",
                "exactly one of prefix, path, regex or safe_regex is required",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "safeRegex")]
    pub safe_regex: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "caseSensitive")]
    pub case_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "runtimeFraction")]
    pub runtime_fraction: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "queryParameters")]
    pub query_parameters: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "clusterHeader")]
    pub cluster_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "weightedClusters")]
    pub weighted_clusters: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty", alias = "prefixRewrite")]
    pub prefix_rewrite: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "hostRewrite")]
    pub host_rewrite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "autoHostRewrite")]
    pub auto_host_rewrite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<ProtoDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "idleTimeout")]
    pub idle_timeout: Option<ProtoDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "retryPolicy")]
    pub retry_policy: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "requestMirrorPolicy")]
    pub request_mirror_policy: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "rateLimits")]
    pub rate_limits: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "hashPolicy")]
    pub hash_policy: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "upgradeConfigs")]
    pub upgrade_configs: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirectResponseAction {
    pub status: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<DataSource>,
}
