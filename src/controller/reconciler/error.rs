//! # Reconciler Errors
//!
//! Every failure carries enough context to decide between retrying and
//! surfacing the problem on the object's status.
//!
//! | Error                     | Class     |
//! |---------------------------|-----------|
//! | decode / duplicate name   | permanent |
//! | secret of wrong type      | permanent |
//! | secret missing TLS data   | permanent |
//! | secret not found          | transient |
//! | secret read failure       | transient |
//! | store read / write        | transient |
//! | status update             | transient |

use super::secrets::SecretError;
use crate::crd::{NodeConfigCache, GROUP, KIND};
use crate::envoy::{DecodeError, ResourceKind};
use crate::snapshot::StoreError;
use kube::ResourceExt;
use std::fmt;
use thiserror::Error;

/// Values longer than this are cut in rendered validation errors
const MAX_RENDERED_VALUE_CHARS: usize = 80;

/// Namespace and name of a NodeConfigCache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn of(obj: &NodeConfigCache) -> Self {
        Self::new(
            obj.namespace().unwrap_or_else(|| "default".to_string()),
            obj.name_any(),
        )
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Position of a spec entry, with the raw value that was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    pub owner: ObjectKey,
    pub kind: ResourceKind,
    pub index: usize,
    /// Encoded value for inline kinds, `namespace/name` for secret refs
    pub value: String,
}

impl ResourceLocation {
    /// Path of the offending field inside the object
    #[must_use]
    pub fn field_path(&self) -> String {
        let leaf = match self.kind {
            ResourceKind::Secret => "ref",
            _ => "value",
        };
        format!(
            "spec.resources.{}[{}].{leaf}",
            self.kind.spec_field(),
            self.index
        )
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.owner, self.field_path())
    }
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("{location}: {source}")]
    Decode {
        location: ResourceLocation,
        #[source]
        source: DecodeError,
    },

    #[error("{location}: duplicate {} name '{name}', already declared at index {first_index}", .location.kind)]
    DuplicateName {
        location: ResourceLocation,
        name: String,
        first_index: usize,
    },

    #[error("{location}: {source}")]
    Secret {
        location: ResourceLocation,
        #[source]
        source: SecretError,
    },

    #[error("failed to read published snapshot for node '{node_id}': {source}")]
    StoreRead {
        node_id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to publish snapshot for node '{node_id}': {source}")]
    StoreWrite {
        node_id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to update status of {object}: {source}")]
    Status {
        object: ObjectKey,
        #[source]
        source: kube::Error,
    },
}

/// Whether retrying without a spec change can succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Permanent,
    Transient,
}

impl ErrorClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Permanent => "permanent",
            ErrorClass::Transient => "transient",
        }
    }
}

impl ReconcilerError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            ReconcilerError::Decode { .. } | ReconcilerError::DuplicateName { .. } => {
                ErrorClass::Permanent
            }
            ReconcilerError::Secret { source, .. } => {
                if source.is_transient() {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Permanent
                }
            }
            ReconcilerError::StoreRead { .. }
            | ReconcilerError::StoreWrite { .. }
            | ReconcilerError::Status { .. } => ErrorClass::Transient,
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Short machine-readable cause, used as a metrics label and status reason
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::Decode { source, .. } => match source {
                DecodeError::Schema { .. } => "SchemaViolation",
                DecodeError::Conversion(_) => "FormatConversionFailed",
                DecodeError::Encoding(_) => "InvalidEncoding",
            },
            ReconcilerError::DuplicateName { .. } => "DuplicateResourceName",
            ReconcilerError::Secret { source, .. } => source.reason(),
            ReconcilerError::StoreRead { .. } => "StoreReadFailed",
            ReconcilerError::StoreWrite { .. } => "StoreWriteFailed",
            ReconcilerError::Status { .. } => "StatusUpdateFailed",
        }
    }

    /// Spec entry the error points at, if any
    #[must_use]
    pub fn location(&self) -> Option<&ResourceLocation> {
        match self {
            ReconcilerError::Decode { location, .. }
            | ReconcilerError::DuplicateName { location, .. }
            | ReconcilerError::Secret { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Field-level validation error for errors tied to a spec entry
    #[must_use]
    pub fn validation_error(&self) -> Option<ValidationError> {
        let location = self.location()?;
        let message = match self {
            ReconcilerError::Decode { source, .. } => source.to_string(),
            ReconcilerError::Secret { source, .. } => source.to_string(),
            ReconcilerError::DuplicateName { first_index, .. } => {
                format!("duplicate name, already declared at index {first_index}")
            }
            _ => self.to_string(),
        };
        Some(ValidationError {
            group: GROUP.to_string(),
            kind: KIND.to_string(),
            object: location.owner.to_string(),
            field: location.field_path(),
            value: location.value.clone(),
            message,
        })
    }
}

/// Structured invalid-field report for the owning object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub group: String,
    pub kind: String,
    /// `namespace/name` of the owning object
    pub object: String,
    pub field: String,
    pub value: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: String = if self.value.chars().count() > MAX_RENDERED_VALUE_CHARS {
            let head: String = self.value.chars().take(MAX_RENDERED_VALUE_CHARS).collect();
            format!("{head}...")
        } else {
            self.value.clone()
        };
        write!(
            f,
            "{}.{} \"{}\" is invalid: {}: Invalid value: {:?}: {}",
            self.kind, self.group, self.object, self.field, value, self.message
        )
    }
}

impl std::error::Error for ValidationError {}
