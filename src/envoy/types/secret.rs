//! # Secret Resources
//!
//! `envoy.api.v2.auth.Secret`, served over SDS.

use super::common::DataSource;
use super::SchemaViolation;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Secret {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "tlsCertificate")]
    pub tls_certificate: Option<TlsCertificate>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "sessionTicketKeys")]
    pub session_ticket_keys: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "validationContext")]
    pub validation_context: Option<Value>,
}

impl Secret {
    /// Build a TLS certificate secret from raw PEM bytes
    ///
    /// The material is carried as inline bytes, so any byte content is
    /// preserved exactly.
    #[must_use]
    pub fn tls(name: impl Into<String>, certificate_chain: &[u8], private_key: &[u8]) -> Self {
        Self {
            name: name.into(),
            tls_certificate: Some(TlsCertificate {
                certificate_chain: Some(DataSource::InlineBytes(STANDARD.encode(certificate_chain))),
                private_key: Some(DataSource::InlineBytes(STANDARD.encode(private_key))),
                ..TlsCertificate::default()
            }),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SchemaViolation> {
        let types = [
            self.tls_certificate.is_some(),
            self.session_ticket_keys.is_some(),
            self.validation_context.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if types > 1 {
            return Err(SchemaViolation::new(
                "type",
                "only one of tls_certificate, session_ticket_keys or validation_context may be set",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TlsCertificate {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "certificateChain")]
    pub certificate_chain: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "privateKey")]
    pub private_key: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "ocspStaple")]
    pub ocsp_staple: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "signedCertificateTimestamp")]
    pub signed_certificate_timestamp: Vec<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "privateKeyProvider")]
    pub private_key_provider: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_secret_carries_material_as_inline_bytes() {
        let secret = Secret::tls("s1", b"cert", b"key");
        let tls = secret.tls_certificate.unwrap();
        assert_eq!(
            tls.certificate_chain,
            Some(DataSource::InlineBytes("Y2VydA==".to_string()))
        );
        assert_eq!(
            tls.private_key,
            Some(DataSource::InlineBytes("a2V5".to_string()))
        );
    }

    #[test]
    fn test_secret_rejects_multiple_types() {
        let mut secret = Secret::tls("s1", b"cert", b"key");
        secret.validation_context = Some(serde_json::json!({}));
        let violation = secret.validate().unwrap_err();
        assert_eq!(violation.field, "type");
    }
}
