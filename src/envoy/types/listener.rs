//! # Listener Resources
//!
//! `envoy.api.v2.Listener` with filter chains. Filter configurations are
//! opaque JSON values.

use super::common::{is_default, Address, Metadata, ProtoDuration, TransportSocket};
use super::SchemaViolation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Listener {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "filterChains")]
    pub filter_chains: Vec<FilterChain>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "useOriginalDst")]
    pub use_original_dst: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "perConnectionBufferLimitBytes")]
    pub per_connection_buffer_limit_bytes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "is_default", alias = "drainType")]
    pub drain_type: DrainType,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "listenerFilters")]
    pub listener_filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "listenerFiltersTimeout")]
    pub listener_filters_timeout: Option<ProtoDuration>,
    #[serde(default, skip_serializing_if = "is_default", alias = "continueOnListenerFiltersTimeout")]
    pub continue_on_listener_filters_timeout: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freebind: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "socketOptions")]
    pub socket_options: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "tcpFastOpenQueueLength")]
    pub tcp_fast_open_queue_length: Option<u32>,
    #[serde(default, skip_serializing_if = "is_default", alias = "trafficDirection")]
    pub traffic_direction: TrafficDirection,
}

impl Listener {
    pub(crate) fn validate(&self) -> Result<(), SchemaViolation> {
        if self.address.is_none() {
            return Err(SchemaViolation::new("address", "is required"));
        }
        for (idx, chain) in self.filter_chains.iter().enumerate() {
            for (filter_idx, filter) in chain.filters.iter().enumerate() {
                if filter.name.is_empty() {
                    return Err(SchemaViolation::new("name", "must not be empty")
                        .within(&format!("filters[{filter_idx}]"))
                        .within(&format!("filter_chains[{idx}]")));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum DrainType {
    #[default]
    #[serde(rename = "DEFAULT")]
    Default,
    #[serde(rename = "MODIFY_ONLY")]
    ModifyOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum TrafficDirection {
    #[default]
    #[serde(rename = "UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "INBOUND")]
    Inbound,
    #[serde(rename = "OUTBOUND")]
    Outbound,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterChain {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "filterChainMatch")]
    pub filter_chain_match: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "tlsContext")]
    pub tls_context: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "useProxyProto")]
    pub use_proxy_proto: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "transportSocket")]
    pub transport_socket: Option<TransportSocket>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Network or listener filter
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "typedConfig")]
    pub typed_config: Option<Value>,
}
