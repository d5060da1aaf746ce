//! Dead Simple Signing Envelope (DSSE) types
//!
//! DSSE is the signature envelope wrapping in-toto statements inside an
//! attestation bundle. Specification: <https://github.com/secure-systems-lab/dsse>

use crate::encoding::{PayloadBytes, SignatureBytes};
use serde::{Deserialize, Serialize};

/// Payload type carried by in-toto attestations
pub const INTOTO_PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";

/// A DSSE envelope containing a signed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseEnvelope {
    /// Type URI of the payload
    pub payload_type: String,
    /// Payload bytes
    pub payload: PayloadBytes,
    /// Signatures over the PAE (Pre-Authentication Encoding)
    pub signatures: Vec<DsseSignature>,
}

/// A signature in a DSSE envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsseSignature {
    /// Signature bytes
    pub sig: SignatureBytes,
    /// Key ID (optional hint for key lookup)
    #[serde(default)]
    pub keyid: String,
}

impl DsseEnvelope {
    /// Get the Pre-Authentication Encoding bytes that were signed
    pub fn pae(&self) -> Vec<u8> {
        pae(&self.payload_type, self.payload.as_bytes())
    }

    /// True when the payload claims to be an in-toto statement
    pub fn is_intoto(&self) -> bool {
        self.payload_type == INTOTO_PAYLOAD_TYPE
    }
}

/// Compute the Pre-Authentication Encoding (PAE)
///
/// Format: `DSSEv1 <len(type)> <type> <len(body)> <body>`
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut result = Vec::new();
    result.extend_from_slice(b"DSSEv1 ");
    result.extend_from_slice(format!("{} ", payload_type.len()).as_bytes());
    result.extend_from_slice(payload_type.as_bytes());
    result.push(b' ');
    result.extend_from_slice(format!("{} ", payload.len()).as_bytes());
    result.extend_from_slice(payload);
    result
}
