//! # Runtime Layers
//!
//! `envoy.service.discovery.v2.Runtime`: a named layer of runtime keys.

use super::common::optional_struct;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Runtime {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// `google.protobuf.Struct`; numbers are held as doubles
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_struct"
    )]
    pub layer: Option<Map<String, Value>>,
}
