//! Extraction of Fulcio-issued claims from a signing certificate.
//!
//! Fulcio records the OIDC identity and the build environment of the
//! signer as X.509 extensions under the Sigstore private enterprise
//! arc `1.3.6.1.4.1.57264.1`. Extension values from `.8` upward are
//! DER UTF8Strings embedded in the extension octet string.

use const_oid::ObjectIdentifier;
use der::asn1::Utf8StringRef;
use der::Decode;
use serde::{Deserialize, Serialize};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::Certificate;

use crate::error::{Error, Result};

pub const OIDC_ISSUER_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.1.8");
pub const BUILD_SIGNER_URI_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.1.9");
pub const RUNNER_ENVIRONMENT_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.1.11");
pub const SOURCE_REPOSITORY_URI_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.1.12");
pub const SOURCE_REPOSITORY_OWNER_URI_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.57264.1.16");

/// The claims a verifier reports about the signing certificate.
///
/// Field names mirror the Fulcio extension names so the serialized
/// form lines up with what other attestation tooling prints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSummary {
    #[serde(
        rename = "subjectAlternativeName",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub subject_alternative_name: String,
    #[serde(rename = "issuer", default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,
    #[serde(
        rename = "buildSignerURI",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub build_signer_uri: String,
    #[serde(
        rename = "runnerEnvironment",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub runner_environment: String,
    #[serde(
        rename = "sourceRepositoryURI",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub source_repository_uri: String,
    #[serde(
        rename = "sourceRepositoryOwnerURI",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub source_repository_owner_uri: String,
}

/// Parses a DER certificate and pulls out the SAN plus the Fulcio
/// claim extensions.
pub fn summarize_certificate(cert_der: &[u8]) -> Result<CertificateSummary> {
    let cert = Certificate::from_der(cert_der)
        .map_err(|e| Error::Verification(format!("failed to parse signing certificate: {e}")))?;

    let mut summary = CertificateSummary {
        subject_alternative_name: subject_alternative_name(&cert)?,
        ..Default::default()
    };

    let Some(extensions) = &cert.tbs_certificate.extensions else {
        return Ok(summary);
    };
    for ext in extensions {
        let value = ext.extn_value.as_bytes();
        match ext.extn_id {
            OIDC_ISSUER_OID => summary.issuer = utf8_extension_value(value)?,
            BUILD_SIGNER_URI_OID => summary.build_signer_uri = utf8_extension_value(value)?,
            RUNNER_ENVIRONMENT_OID => summary.runner_environment = utf8_extension_value(value)?,
            SOURCE_REPOSITORY_URI_OID => {
                summary.source_repository_uri = utf8_extension_value(value)?
            }
            SOURCE_REPOSITORY_OWNER_URI_OID => {
                summary.source_repository_owner_uri = utf8_extension_value(value)?
            }
            _ => {}
        }
    }
    Ok(summary)
}

/// The URI form of the certificate's subject alternative name, or empty
/// when the certificate has no SAN extension.
fn subject_alternative_name(cert: &Certificate) -> Result<String> {
    let Some(extensions) = &cert.tbs_certificate.extensions else {
        return Ok(String::new());
    };
    for ext in extensions {
        if ext.extn_id != const_oid::db::rfc5280::ID_CE_SUBJECT_ALT_NAME {
            continue;
        }
        let san = SubjectAltName::from_der(ext.extn_value.as_bytes())
            .map_err(|e| Error::Verification(format!("failed to parse certificate SAN: {e}")))?;
        for name in san.0 {
            if let GeneralName::UniformResourceIdentifier(uri) = name {
                return Ok(uri.to_string());
            }
        }
    }
    Ok(String::new())
}

/// Fulcio wraps string-valued extensions in a DER UTF8String. Early
/// deployments wrote the raw bytes instead, so fall back to that.
fn utf8_extension_value(value: &[u8]) -> Result<String> {
    if let Ok(s) = Utf8StringRef::from_der(value) {
        return Ok(s.to_string());
    }
    String::from_utf8(value.to_vec())
        .map_err(|_| Error::Verification("certificate extension is not valid UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    pub(crate) fn leaf_der() -> Vec<u8> {
        let b64: String = include_str!("testdata/fulcio_leaf.b64")
            .split_whitespace()
            .collect();
        STANDARD.decode(b64).unwrap()
    }

    #[test]
    fn test_summarize_fulcio_leaf() {
        let summary = summarize_certificate(&leaf_der()).unwrap();
        assert_eq!(
            summary.subject_alternative_name,
            "https://github.com/always-further/test-sk-prov/.github/workflows/sign-skills.yml@refs/heads/main"
        );
        assert_eq!(summary.issuer, "https://token.actions.githubusercontent.com");
        assert_eq!(summary.runner_environment, "github-hosted");
        assert_eq!(
            summary.source_repository_uri,
            "https://github.com/always-further/test-sk-prov"
        );
        assert_eq!(
            summary.source_repository_owner_uri,
            "https://github.com/always-further"
        );
        assert_eq!(
            summary.build_signer_uri,
            "https://github.com/always-further/test-sk-prov/.github/workflows/sign-skills.yml@refs/heads/main"
        );
    }

    #[test]
    fn test_summary_round_trips_as_camel_case_json() {
        let summary = summarize_certificate(&leaf_der()).unwrap();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"sourceRepositoryOwnerURI\""));
        let parsed: CertificateSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_garbage_certificate_is_rejected() {
        let err = summarize_certificate(b"not a certificate").unwrap_err();
        assert!(err.to_string().contains("failed to parse signing certificate"));
    }
}
