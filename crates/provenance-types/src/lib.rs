//! Core types and data structures for attestation verification
//!
//! This crate provides the fundamental data model shared by the rest of the
//! workspace: the Sigstore bundle format, DSSE envelopes, in-toto statements,
//! and the digest algorithms accepted for artifact subjects.
//!
//! Everything here is pure data; network and filesystem concerns live in the
//! `provenance-artifact` and `provenance-fetch` crates.

pub mod bundle;
pub mod dsse;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod intoto;

pub use bundle::{
    Bundle, CertificateContent, MediaType, MessageDigest, MessageSignature, SignatureContent,
    TimestampVerificationData, TransparencyLogEntry, VerificationMaterial,
    VerificationMaterialContent,
};
pub use dsse::{pae, DsseEnvelope, DsseSignature, INTOTO_PAYLOAD_TYPE};
pub use encoding::{DerCertificate, DigestBytes, PayloadBytes, SignatureBytes, SignedTimestamp};
pub use error::{Error, Result};
pub use hash::HashAlgorithm;
pub use intoto::{Statement, Subject};
