//! Digested artifact resolution
//!
//! A reference is classified by prefix: `oci://` resolves against a registry,
//! `file://` is decoded to an explicit local path, and anything else is
//! treated as a local path as-is.

use crate::digest::digest_file;
use crate::error::{Error, Result};
use crate::oci::RegistryClient;
use oci_distribution::Reference;
use percent_encoding::percent_decode_str;
use provenance_types::HashAlgorithm;
use std::path::PathBuf;

const OCI_SCHEME: &str = "oci://";
const FILE_SCHEME: &str = "file://";

/// An artifact resolved to its content digest
///
/// Immutable once constructed; `digest_with_alg` is the join key used to
/// match the artifact against attestation subjects.
#[derive(Debug, Clone)]
pub struct DigestedArtifact {
    /// The reference as supplied by the caller
    pub url: String,
    /// Lowercase hex digest of the artifact content
    pub digest: String,
    /// Algorithm the digest was computed with
    pub algorithm: HashAlgorithm,
    /// Parsed registry reference, present only for `oci://` artifacts
    pub name_ref: Option<Reference>,
}

impl DigestedArtifact {
    /// The `algorithm:digest` subject key (e.g. `sha256:ab12...`)
    pub fn digest_with_alg(&self) -> String {
        format!("{}:{}", self.algorithm, self.digest)
    }
}

/// Resolve a reference to a digested artifact
///
/// Local files are streamed through the requested digest algorithm. Registry
/// artifacts are resolved to the digest reported by the registry, which also
/// fixes the algorithm (the caller-requested algorithm applies to local files
/// only).
pub async fn resolve(
    registry: &dyn RegistryClient,
    reference: &str,
    algorithm: HashAlgorithm,
) -> Result<DigestedArtifact> {
    if let Some(image) = reference.strip_prefix(OCI_SCHEME) {
        return resolve_registry_artifact(registry, reference, image).await;
    }

    let path = if let Some(uri_path) = reference.strip_prefix(FILE_SCHEME) {
        local_path_from_uri(uri_path)
    } else {
        PathBuf::from(reference)
    };

    let digest = digest_file(&path, algorithm)?;
    Ok(DigestedArtifact {
        url: reference.to_string(),
        digest,
        algorithm,
        name_ref: None,
    })
}

async fn resolve_registry_artifact(
    registry: &dyn RegistryClient,
    url: &str,
    image: &str,
) -> Result<DigestedArtifact> {
    let name_ref: Reference = image
        .parse()
        .map_err(|e| Error::InvalidReference(format!("{image}: {e}")))?;

    let digest = registry.get_image_digest(&name_ref).await?;
    let (alg_name, hex) = digest
        .split_once(':')
        .ok_or_else(|| Error::Registry(format!("registry returned malformed digest: {digest}")))?;
    let algorithm: HashAlgorithm = alg_name
        .parse()
        .map_err(|_| Error::Registry(format!("registry digest uses unsupported algorithm: {alg_name}")))?;

    Ok(DigestedArtifact {
        url: url.to_string(),
        digest: hex.to_string(),
        algorithm,
        name_ref: Some(name_ref),
    })
}

/// Decode a `file://` URI path into an OS path
///
/// Percent-escapes are decoded and forward slashes are normalized to the
/// platform separator.
fn local_path_from_uri(uri_path: &str) -> PathBuf {
    let decoded = percent_decode_str(uri_path).decode_utf8_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        PathBuf::from(decoded.as_ref())
    } else {
        PathBuf::from(decoded.replace('/', &std::path::MAIN_SEPARATOR.to_string()))
    }
}
