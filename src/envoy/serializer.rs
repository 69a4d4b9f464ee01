//! # Resource Serializer
//!
//! Decodes the textual `value` of a spec entry into a typed [`Resource`].
//!
//! Three interchangeable formats are supported:
//!
//! - **Structured**: JSON, parsed directly against the kind's schema
//! - **HumanReadable**: YAML, converted to JSON first and then parsed
//! - **EncodedStructured**: base64-wrapped JSON
//!
//! The format is declared once per spec and applies to every entry of that
//! pass. It is never guessed from the content.
//!
//! ## Errors
//!
//! Conversion and encoding problems are reported separately from schema
//! violations, so an operator can tell a YAML indentation mistake from an
//! unknown Envoy field.

use crate::envoy::types::{Cluster, ClusterLoadAssignment, Listener, RouteConfiguration, Runtime, Secret};
use crate::envoy::{Resource, ResourceKind};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decoder injected into the resource loader
pub type DecodeFn = fn(&str, ResourceKind) -> Result<Resource, DecodeError>;

/// Text format of every resource value in one spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Format {
    #[default]
    #[serde(rename = "structured", alias = "json")]
    Structured,
    #[serde(rename = "human-readable", alias = "yaml")]
    HumanReadable,
    #[serde(rename = "encoded-structured", alias = "b64json")]
    EncodedStructured,
}

impl Format {
    pub const ALL: [Format; 3] = [
        Format::Structured,
        Format::HumanReadable,
        Format::EncodedStructured,
    ];

    /// Decoder function for this format
    #[must_use]
    pub fn decoder(self) -> DecodeFn {
        match self {
            Format::Structured => decode_structured,
            Format::HumanReadable => decode_human_readable,
            Format::EncodedStructured => decode_encoded_structured,
        }
    }

    /// Decode a single value
    pub fn decode(self, encoded: &str, kind: ResourceKind) -> Result<Resource, DecodeError> {
        (self.decoder())(encoded, kind)
    }

    /// Encode a resource so that [`Format::decode`] yields it back
    pub fn encode(self, resource: &Resource) -> Result<String, EncodeError> {
        match self {
            Format::Structured => Ok(serde_json::to_string(resource)?),
            // Through a JSON value so oneof fields come out as plain mappings
            // rather than YAML tags.
            Format::HumanReadable => Ok(serde_yaml::to_string(&serde_json::to_value(resource)?)?),
            Format::EncodedStructured => Ok(STANDARD.encode(serde_json::to_string(resource)?)),
        }
    }

    /// Parse a format name, accepting the legacy aliases
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "structured" | "json" => Some(Format::Structured),
            "human-readable" | "yaml" => Some(Format::HumanReadable),
            "encoded-structured" | "b64json" => Some(Format::EncodedStructured),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Structured => "structured",
            Format::HumanReadable => "human-readable",
            Format::EncodedStructured => "encoded-structured",
        };
        f.write_str(name)
    }
}

/// Decoding failures, all permanent until the spec is edited
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("schema violation for {kind}{}: {message}", field_suffix(.field))]
    Schema {
        kind: ResourceKind,
        field: Option<String>,
        message: String,
    },

    #[error("format conversion failed: {0}")]
    Conversion(String),

    #[error("invalid encoding: {0}")]
    Encoding(String),
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|field| format!(" field '{field}'"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parse JSON against the schema of `kind`
pub fn decode_structured(encoded: &str, kind: ResourceKind) -> Result<Resource, DecodeError> {
    let resource = match kind {
        ResourceKind::Endpoint => Resource::Endpoint(parse::<ClusterLoadAssignment>(encoded, kind)?),
        ResourceKind::Cluster => Resource::Cluster(parse::<Cluster>(encoded, kind)?),
        ResourceKind::Route => Resource::Route(parse::<RouteConfiguration>(encoded, kind)?),
        ResourceKind::Listener => Resource::Listener(parse::<Listener>(encoded, kind)?),
        ResourceKind::Secret => Resource::Secret(parse::<Secret>(encoded, kind)?),
        ResourceKind::Runtime => Resource::Runtime(parse::<Runtime>(encoded, kind)?),
    };

    resource.validate().map_err(|violation| DecodeError::Schema {
        kind,
        field: Some(violation.field),
        message: violation.message,
    })?;

    Ok(resource)
}

/// Convert YAML to JSON, then parse
pub fn decode_human_readable(encoded: &str, kind: ResourceKind) -> Result<Resource, DecodeError> {
    let value: serde_json::Value =
        serde_yaml::from_str(encoded).map_err(|e| DecodeError::Conversion(e.to_string()))?;
    let json = serde_json::to_string(&value).map_err(|e| DecodeError::Conversion(e.to_string()))?;
    decode_structured(&json, kind)
}

/// Strip the base64 wrapping, then parse
///
/// Line breaks and other ASCII whitespace are ignored, so output of tools
/// that wrap at 76 columns decodes as is.
pub fn decode_encoded_structured(encoded: &str, kind: ResourceKind) -> Result<Resource, DecodeError> {
    let compact: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| DecodeError::Encoding(e.to_string()))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| DecodeError::Encoding(format!("decoded value is not UTF-8: {e}")))?;
    decode_structured(&json, kind)
}

fn parse<T: DeserializeOwned>(encoded: &str, kind: ResourceKind) -> Result<T, DecodeError> {
    serde_json::from_str(encoded).map_err(|e| {
        let message = e.to_string();
        DecodeError::Schema {
            kind,
            field: offending_field(&message),
            message,
        }
    })
}

/// serde names the field in backticks for unknown, missing and duplicate fields
fn offending_field(message: &str) -> Option<String> {
    let rest = ["unknown field `", "missing field `", "duplicate field `"]
        .iter()
        .find_map(|prefix| message.strip_prefix(prefix))?;
    rest.split_once('`').map(|(field, _)| field.to_string())
}
