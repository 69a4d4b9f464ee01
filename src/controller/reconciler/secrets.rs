//! # Secret Resolution
//!
//! Turns a secret reference from the spec into an SDS `Secret` resource.
//!
//! Only TLS-typed secrets are accepted, and both the certificate chain and
//! the private key must be present. Anything else fails the whole pass
//! instead of being skipped, so a node never ends up with a listener that
//! points at a certificate that was silently dropped.

use crate::constants::{TLS_CERTIFICATE_KEYS, TLS_PRIVATE_KEY_KEYS, TLS_SECRET_TYPES};
use crate::envoy::types::Secret as EnvoySecret;
use crate::envoy::Resource;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Secret as read from the backing store
#[derive(Clone, PartialEq, Eq)]
pub struct StoredSecret {
    pub secret_type: String,
    pub data: BTreeMap<String, Vec<u8>>,
}

impl std::fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSecret")
            .field("secret_type", &self.secret_type)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
    #[error("secret {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("secret {namespace}/{name} has type '{secret_type}', expected one of {}", TLS_SECRET_TYPES.join(", "))]
    WrongType {
        namespace: String,
        name: String,
        secret_type: String,
    },

    #[error("secret {namespace}/{name} has no '{key}' entry")]
    MissingData {
        namespace: String,
        name: String,
        key: String,
    },

    #[error("failed to read secret {namespace}/{name}: {message}")]
    Read {
        namespace: String,
        name: String,
        message: String,
    },
}

impl SecretError {
    /// A missing secret may still be created; a malformed one needs an edit
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, SecretError::NotFound { .. } | SecretError::Read { .. })
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            SecretError::NotFound { .. } => "SecretNotFound",
            SecretError::WrongType { .. } => "SecretTypeInvalid",
            SecretError::MissingData { .. } => "SecretDataMissing",
            SecretError::Read { .. } => "SecretReadFailed",
        }
    }
}

/// Key/value store that secret material is read from
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// `None` when no secret exists under that identity
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StoredSecret>, SecretError>;
}

/// Reads Kubernetes Secrets through the API server
#[derive(Clone)]
pub struct KubeSecretSource {
    client: Client,
}

impl KubeSecretSource {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for KubeSecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretSource for KubeSecretSource {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StoredSecret>, SecretError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets.get_opt(name).await.map_err(|e| SecretError::Read {
            namespace: namespace.to_string(),
            name: name.to_string(),
            message: e.to_string(),
        })?;

        Ok(secret.map(|secret| StoredSecret {
            secret_type: secret.type_.unwrap_or_default(),
            data: secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect(),
        }))
    }
}

/// Builds SDS secrets from stored TLS material
pub struct SecretResolver<'a> {
    source: &'a dyn SecretSource,
}

impl<'a> SecretResolver<'a> {
    #[must_use]
    pub fn new(source: &'a dyn SecretSource) -> Self {
        Self { source }
    }

    /// Resolve `namespace/secret_name` into a secret served as `name`
    ///
    /// `name` is the logical name from the spec and need not match the
    /// stored secret's name.
    pub async fn resolve(
        &self,
        name: &str,
        namespace: &str,
        secret_name: &str,
    ) -> Result<Resource, SecretError> {
        let stored = self
            .source
            .get_secret(namespace, secret_name)
            .await?
            .ok_or_else(|| SecretError::NotFound {
                namespace: namespace.to_string(),
                name: secret_name.to_string(),
            })?;

        if !TLS_SECRET_TYPES.contains(&stored.secret_type.as_str()) {
            return Err(SecretError::WrongType {
                namespace: namespace.to_string(),
                name: secret_name.to_string(),
                secret_type: stored.secret_type,
            });
        }

        let certificate = tls_entry(&stored, TLS_CERTIFICATE_KEYS, namespace, secret_name)?;
        let private_key = tls_entry(&stored, TLS_PRIVATE_KEY_KEYS, namespace, secret_name)?;

        debug!(
            secret.name = name,
            secret.source = %format!("{namespace}/{secret_name}"),
            "Resolved TLS secret"
        );

        Ok(Resource::Secret(EnvoySecret::tls(
            name,
            certificate,
            private_key,
        )))
    }
}

/// First entry present under any of `keys`
fn tls_entry<'s>(
    stored: &'s StoredSecret,
    keys: &[&str],
    namespace: &str,
    name: &str,
) -> Result<&'s [u8], SecretError> {
    keys.iter()
        .find_map(|key| stored.data.get(*key))
        .map(Vec::as_slice)
        .ok_or_else(|| SecretError::MissingData {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: keys.first().copied().unwrap_or_default().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<(String, String), StoredSecret>);

    #[async_trait]
    impl SecretSource for MapSource {
        async fn get_secret(
            &self,
            namespace: &str,
            name: &str,
        ) -> Result<Option<StoredSecret>, SecretError> {
            Ok(self.0.get(&(namespace.to_string(), name.to_string())).cloned())
        }
    }

    fn source(secret_type: &str, keys: &[&str]) -> MapSource {
        let data = keys
            .iter()
            .map(|key| (key.to_string(), format!("{key}-bytes").into_bytes()))
            .collect();
        let mut map = HashMap::new();
        map.insert(
            ("ns1".to_string(), "k1".to_string()),
            StoredSecret {
                secret_type: secret_type.to_string(),
                data,
            },
        );
        MapSource(map)
    }

    #[tokio::test]
    async fn test_resolves_under_logical_name() {
        let source = source("kubernetes.io/tls", &["tls.crt", "tls.key"]);
        let resolver = SecretResolver::new(&source);
        let resource = resolver.resolve("s1", "ns1", "k1").await.unwrap();
        match resource {
            Resource::Secret(secret) => {
                assert_eq!(secret.name, "s1");
                assert_eq!(secret, EnvoySecret::tls("s1", b"tls.crt-bytes", b"tls.key-bytes"));
            }
            other => panic!("expected secret, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_short_type_and_field_names_are_accepted() {
        let source = source("tls", &["certificate", "privateKey"]);
        let resolver = SecretResolver::new(&source);
        assert!(resolver.resolve("s1", "ns1", "k1").await.is_ok());
    }

    #[tokio::test]
    async fn test_opaque_secret_is_rejected() {
        let source = source("opaque", &["tls.crt", "tls.key"]);
        let resolver = SecretResolver::new(&source);
        let err = resolver.resolve("s1", "ns1", "k1").await.unwrap_err();
        assert!(matches!(err, SecretError::WrongType { ref secret_type, .. } if secret_type == "opaque"));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_private_key_is_rejected() {
        let source = source("kubernetes.io/tls", &["tls.crt"]);
        let resolver = SecretResolver::new(&source);
        let err = resolver.resolve("s1", "ns1", "k1").await.unwrap_err();
        assert_eq!(
            err,
            SecretError::MissingData {
                namespace: "ns1".to_string(),
                name: "k1".to_string(),
                key: "tls.key".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_absent_secret_is_transient() {
        let source = source("kubernetes.io/tls", &["tls.crt", "tls.key"]);
        let resolver = SecretResolver::new(&source);
        let err = resolver.resolve("s1", "ns1", "missing").await.unwrap_err();
        assert!(matches!(err, SecretError::NotFound { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_stored_secret_debug_hides_data() {
        let secret = StoredSecret {
            secret_type: "tls".to_string(),
            data: BTreeMap::from([("tls.key".to_string(), b"private".to_vec())]),
        };
        let rendered = format!("{secret:?}");
        assert!(rendered.contains("tls.key"));
        assert!(!rendered.contains("private\""));
    }
}
