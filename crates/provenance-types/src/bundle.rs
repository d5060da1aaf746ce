//! Sigstore bundle format types
//!
//! A bundle is the unit of attestation retrieval and verification: it carries
//! the DSSE envelope (or raw message signature), the verification material
//! (signing certificate or public key hint), and transparency log entries.

use crate::dsse::DsseEnvelope;
use crate::encoding::{DerCertificate, DigestBytes, SignatureBytes, SignedTimestamp};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Bundle media types by format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MediaType {
    /// Bundle format version 0.1
    Bundle0_1,
    /// Bundle format version 0.2
    Bundle0_2,
    /// Bundle format version 0.3
    Bundle0_3,
}

impl MediaType {
    /// Get the media type string
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Bundle0_1 => "application/vnd.dev.sigstore.bundle+json;version=0.1",
            MediaType::Bundle0_2 => "application/vnd.dev.sigstore.bundle+json;version=0.2",
            MediaType::Bundle0_3 => "application/vnd.dev.sigstore.bundle.v0.3+json",
        }
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "application/vnd.dev.sigstore.bundle+json;version=0.1" => Ok(MediaType::Bundle0_1),
            "application/vnd.dev.sigstore.bundle+json;version=0.2" => Ok(MediaType::Bundle0_2),
            "application/vnd.dev.sigstore.bundle.v0.3+json" => Ok(MediaType::Bundle0_3),
            // Also accept the alternative v0.3 spelling
            "application/vnd.dev.sigstore.bundle+json;version=0.3" => Ok(MediaType::Bundle0_3),
            _ => Err(Error::InvalidMediaType(s.to_string())),
        }
    }
}

/// An attestation bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Media type identifying the bundle format version
    pub media_type: String,
    /// Certificate / key material and transparency log entries
    pub verification_material: VerificationMaterial,
    /// The signed content
    #[serde(flatten)]
    pub content: SignatureContent,
}

/// The signed content of a bundle: either a DSSE envelope or a raw message signature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SignatureContent {
    /// DSSE envelope wrapping an in-toto statement
    #[serde(rename = "dsseEnvelope")]
    DsseEnvelope(DsseEnvelope),
    /// Detached signature over the artifact digest
    #[serde(rename = "messageSignature")]
    MessageSignature(MessageSignature),
}

/// Verification material attached to a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMaterial {
    /// Certificate, certificate chain, or public key hint
    #[serde(flatten)]
    pub content: VerificationMaterialContent,
    /// Transparency log entries proving inclusion
    #[serde(default)]
    pub tlog_entries: Vec<TransparencyLogEntry>,
    /// RFC 3161 timestamps, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_verification_data: Option<TimestampVerificationData>,
}

/// The key material variants of a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerificationMaterialContent {
    /// A single signing certificate (bundle >= 0.2)
    #[serde(rename = "certificate")]
    Certificate(CertificateContent),
    /// A full certificate chain, leaf first (bundle 0.1)
    #[serde(rename = "x509CertificateChain")]
    X509CertificateChain {
        #[serde(default)]
        certificates: Vec<CertificateContent>,
    },
    /// A hint identifying a pre-distributed public key
    #[serde(rename = "publicKey")]
    PublicKey {
        #[serde(default)]
        hint: String,
    },
}

/// A DER certificate wrapped in the bundle's JSON encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateContent {
    /// DER-encoded certificate bytes
    pub raw_bytes: DerCertificate,
}

/// A detached message signature over the artifact digest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSignature {
    /// Digest of the signed artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_digest: Option<MessageDigest>,
    /// Signature bytes
    pub signature: SignatureBytes,
}

/// Digest descriptor inside a message signature
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDigest {
    /// Algorithm name as serialized by the bundle format (e.g. `SHA2_256`)
    pub algorithm: String,
    /// Raw digest bytes
    pub digest: DigestBytes,
}

/// An entry in a transparency log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransparencyLogEntry {
    /// Index of the entry in the log
    #[serde(default)]
    pub log_index: String,
    /// Identifier of the log that holds this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<LogId>,
    /// Time the entry was integrated, as a Unix timestamp string
    #[serde(default)]
    pub integrated_time: String,
    /// Signed inclusion promise (SET), when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion_promise: Option<serde_json::Value>,
    /// Merkle inclusion proof, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion_proof: Option<serde_json::Value>,
    /// Entry kind and version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind_version: Option<serde_json::Value>,
    /// Canonicalized entry body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonicalized_body: Option<String>,
}

/// Log identifier (SHA-256 of the log's public key)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogId {
    /// Base64-encoded key id
    pub key_id: String,
}

/// RFC 3161 timestamps attached to a bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampVerificationData {
    #[serde(default)]
    pub rfc3161_timestamps: Vec<Rfc3161Timestamp>,
}

/// A single RFC 3161 timestamp token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rfc3161Timestamp {
    pub signed_timestamp: SignedTimestamp,
}

impl Bundle {
    /// Parse a bundle from JSON
    pub fn from_json(json: &str) -> Result<Bundle> {
        serde_json::from_str(json).map_err(Error::Json)
    }

    /// Serialize the bundle to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Json)
    }

    /// Get the bundle version from the media type
    pub fn version(&self) -> Result<MediaType> {
        MediaType::from_str(&self.media_type)
    }

    /// True when the bundle format version is at least `min`
    pub fn min_version(&self, min: MediaType) -> bool {
        self.version().map(|v| v >= min).unwrap_or(false)
    }

    /// Get the leaf signing certificate, if the bundle carries one
    pub fn signing_certificate(&self) -> Option<&DerCertificate> {
        match &self.verification_material.content {
            VerificationMaterialContent::Certificate(cert) => Some(&cert.raw_bytes),
            VerificationMaterialContent::X509CertificateChain { certificates } => {
                certificates.first().map(|c| &c.raw_bytes)
            }
            VerificationMaterialContent::PublicKey { .. } => None,
        }
    }

    /// Get the DSSE envelope, if the bundle wraps one
    pub fn dsse_envelope(&self) -> Option<&DsseEnvelope> {
        match &self.content {
            SignatureContent::DsseEnvelope(env) => Some(env),
            _ => None,
        }
    }

    /// Get the message signature, if the bundle carries one
    pub fn message_signature(&self) -> Option<&MessageSignature> {
        match &self.content {
            SignatureContent::MessageSignature(sig) => Some(sig),
            _ => None,
        }
    }

    /// Transparency log entries attached to the bundle
    pub fn tlog_entries(&self) -> &[TransparencyLogEntry] {
        &self.verification_material.tlog_entries
    }

    /// The earliest integrated time across the bundle's transparency log
    /// entries, as a Unix timestamp
    pub fn integrated_time_secs(&self) -> Option<i64> {
        self.tlog_entries()
            .iter()
            .filter_map(TransparencyLogEntry::integrated_time_secs)
            .min()
    }
}

impl TransparencyLogEntry {
    /// The integrated time as a Unix timestamp, ignoring zero/invalid values
    pub fn integrated_time_secs(&self) -> Option<i64> {
        self.integrated_time
            .parse::<i64>()
            .ok()
            .filter(|t| *t > 0)
    }
}
