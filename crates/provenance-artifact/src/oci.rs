//! OCI registry client capability
//!
//! The resolver needs two registry operations: resolving a reference to its
//! manifest digest, and listing attestation bundles attached to that digest
//! via the OCI referrers API. Both are modeled on one narrow trait so tests
//! can substitute a mock, and the live client speaks the distribution HTTP
//! API directly.

use crate::error::{Error, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use oci_distribution::Reference;
use provenance_types::Bundle;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::io::Read;

/// Artifact type prefix identifying attestation bundles among referrers
pub const SIGSTORE_BUNDLE_ARTIFACT_TYPE: &str = "application/vnd.dev.sigstore.bundle";

const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json";

const REFERRERS_ACCEPT: &str = "application/vnd.oci.image.index.v1+json";

/// Registry operations required by artifact resolution
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Resolve a reference to its manifest digest (`algorithm:hex`)
    async fn get_image_digest(&self, reference: &Reference) -> Result<String>;

    /// List attestation bundles attached to the digest via the referrers API
    async fn get_attestations(&self, reference: &Reference, digest: &str) -> Result<Vec<Bundle>>;
}

/// Live registry client speaking the OCI distribution HTTP API
///
/// The caller must already be authenticated with the registry; an optional
/// bearer token is attached to every request when supplied.
pub struct HttpRegistryClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl HttpRegistryClient {
    /// Create a client, optionally carrying a registry bearer token
    pub fn new(token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    fn base_url(&self, reference: &Reference) -> String {
        format!(
            "https://{}/v2/{}",
            reference.resolve_registry(),
            reference.repository()
        )
    }

    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        let mut request = self.http.get(url).header(reqwest::header::ACCEPT, accept);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::Registry(format!("request to {url} failed: {e}")))?;
        check_access(&response)?;
        if !response.status().is_success() {
            return Err(Error::Registry(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

/// Distinguish 401 (needs authentication) from 403 (token lacks access)
fn check_access(response: &reqwest::Response) -> Result<()> {
    match response.status() {
        reqwest::StatusCode::UNAUTHORIZED => Err(Error::RegistryAuthz),
        reqwest::StatusCode::FORBIDDEN => Err(Error::AccessDenied),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
struct ReferrersIndex {
    #[serde(default)]
    manifests: Vec<ReferrerDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ReferrerDescriptor {
    digest: String,
    #[serde(default, rename = "artifactType")]
    artifact_type: String,
}

#[derive(Debug, Deserialize)]
struct ImageManifest {
    #[serde(default)]
    layers: Vec<LayerDescriptor>,
}

#[derive(Debug, Deserialize)]
struct LayerDescriptor {
    digest: String,
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn get_image_digest(&self, reference: &Reference) -> Result<String> {
        // A digest reference already names the content
        if let Some(digest) = reference.digest() {
            return Ok(digest.to_string());
        }

        let tag = reference.tag().unwrap_or("latest");
        let url = format!("{}/manifests/{}", self.base_url(reference), tag);
        let response = self.get(&url, MANIFEST_ACCEPT).await?;

        // Prefer the digest reported by the registry; fall back to hashing
        // the manifest body when the header is absent.
        if let Some(digest) = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
        {
            return Ok(digest.to_string());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Registry(format!("failed to read manifest body: {e}")))?;
        Ok(format!("sha256:{}", hex::encode(Sha256::digest(&body))))
    }

    async fn get_attestations(&self, reference: &Reference, digest: &str) -> Result<Vec<Bundle>> {
        let base = self.base_url(reference);
        let url = format!("{base}/referrers/{digest}");
        let index: ReferrersIndex = self
            .get(&url, REFERRERS_ACCEPT)
            .await?
            .json()
            .await
            .map_err(|e| Error::Registry(format!("failed to parse referrers index: {e}")))?;

        let mut bundles = Vec::new();
        for descriptor in index
            .manifests
            .iter()
            .filter(|m| m.artifact_type.starts_with(SIGSTORE_BUNDLE_ARTIFACT_TYPE))
        {
            let manifest_url = format!("{base}/manifests/{}", descriptor.digest);
            let manifest: ImageManifest = self
                .get(&manifest_url, MANIFEST_ACCEPT)
                .await?
                .json()
                .await
                .map_err(|e| Error::Registry(format!("failed to parse referrer manifest: {e}")))?;

            // Bundle content is the first layer of the referrer manifest
            let Some(layer) = manifest.layers.first() else {
                tracing::warn!(digest = %descriptor.digest, "referrer manifest has no layers");
                continue;
            };

            let blob_url = format!("{base}/blobs/{}", layer.digest);
            let blob = self
                .get(&blob_url, "application/octet-stream")
                .await?
                .bytes()
                .await
                .map_err(|e| Error::Registry(format!("failed to read bundle blob: {e}")))?;

            let json = decompress_if_gzipped(&blob)?;
            match serde_json::from_slice::<Bundle>(&json) {
                Ok(bundle) => bundles.push(bundle),
                Err(e) => {
                    tracing::warn!(digest = %layer.digest, "skipping undecodable bundle blob: {e}");
                }
            }
        }

        Ok(bundles)
    }
}

/// Gunzip the blob when it carries the gzip magic, otherwise pass it through
fn decompress_if_gzipped(blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() >= 2 && blob[0] == 0x1f && blob[1] == 0x8b {
        let mut decoder = GzDecoder::new(blob);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| Error::Registry(format!("failed to decompress bundle layer: {e}")))?;
        Ok(decompressed)
    } else {
        Ok(blob.to_vec())
    }
}
