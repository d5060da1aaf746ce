//! Trusted root data model
//!
//! A trusted root describes the certificate authorities and transparency
//! logs a verifier accepts. Custom root files may hold several documents,
//! newline-delimited, one per Sigstore instance.

use crate::error::{Error, Result};
use crate::x509::{issuer_organizations, parse_certificate};
use chrono::{DateTime, Utc};
use provenance_types::CertificateContent;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A parsed trusted root document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedRoot {
    #[serde(default)]
    pub media_type: String,
    /// Transparency logs (Rekor)
    #[serde(default)]
    pub tlogs: Vec<TransparencyLog>,
    /// Fulcio certificate authorities
    #[serde(default)]
    pub certificate_authorities: Vec<CertificateAuthority>,
    /// Certificate transparency logs
    #[serde(default)]
    pub ctlogs: Vec<TransparencyLog>,
    /// RFC 3161 timestamp authorities
    #[serde(default)]
    pub timestamp_authorities: Vec<CertificateAuthority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransparencyLog {
    #[serde(default)]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<LogPublicKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPublicKey {
    pub raw_bytes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_for: Option<TimeRange>,
}

/// A certificate authority entry: a chain ordered lowest certificate first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateAuthority {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub cert_chain: CertificateChain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_for: Option<TimeRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateChain {
    #[serde(default)]
    pub certificates: Vec<CertificateContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl TrustedRoot {
    /// Parse a single trusted root document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Json)
    }

    /// Parse one or more newline-delimited trusted root documents
    pub fn from_json_lines(contents: &str) -> Result<Vec<Self>> {
        let mut roots = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            roots.push(Self::from_json(line)?);
        }
        Ok(roots)
    }

    /// Read trusted root documents from a file
    pub fn from_file(path: &Path) -> Result<Vec<Self>> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_lines(&contents)
    }

    /// True when any certificate authority's lowest certificate was issued
    /// by `organization`
    pub fn matches_issuer_organization(&self, organization: &str) -> bool {
        self.certificate_authorities.iter().any(|ca| {
            ca.issuer_organization()
                .map(|org| org == organization)
                .unwrap_or(false)
        })
    }
}

impl CertificateAuthority {
    /// The certificate closest to issued leaves: the first in the chain
    ///
    /// Chains are ordered lowest first, root last. A single-certificate
    /// chain is just the root.
    pub fn lowest_certificate(&self) -> Result<&CertificateContent> {
        self.cert_chain
            .certificates
            .first()
            .ok_or(Error::EmptyCertificateChain)
    }

    /// Issuer organization of the lowest certificate, if it has exactly one
    pub fn issuer_organization(&self) -> Option<String> {
        let cert = self.lowest_certificate().ok()?;
        let parsed = parse_certificate(cert.raw_bytes.as_bytes()).ok()?;
        let mut organizations = issuer_organizations(&parsed);
        if organizations.is_empty() {
            return None;
        }
        Some(organizations.remove(0))
    }
}
