//! Attestation fetch dispatch
//!
//! Three sources, in precedence order: a local bundle file, bundles attached
//! to the artifact in its OCI registry, and the attestations API. Repo-scoped
//! API lookup wins over org-scoped lookup when both are configured.

use crate::api::{Attestation, AttestationsClient};
use crate::error::{Error, Result};
use crate::local::load_bundles_from_file;
use provenance_artifact::{DigestedArtifact, RegistryClient};
use std::path::PathBuf;

/// Where and how to look for attestations
#[derive(Debug, Default)]
pub struct FetchConfig {
    /// Path to a local `.json`/`.jsonl` bundle file; takes precedence over
    /// every remote source
    pub bundle_path: Option<PathBuf>,
    /// Read bundles attached to the image in its registry instead of the API
    pub use_bundle_from_registry: bool,
    /// Repository (`owner/repo`) to scope the API lookup by
    pub repo: Option<String>,
    /// Organization to scope the API lookup by; ignored when `repo` is set
    pub owner: Option<String>,
    /// Maximum number of attestations to fetch from the API
    pub limit: usize,
}

/// Fetch attestations for the artifact according to the configured source
pub async fn fetch_attestations(
    config: &FetchConfig,
    api: &dyn AttestationsClient,
    registry: &dyn RegistryClient,
    artifact: &DigestedArtifact,
) -> Result<Vec<Attestation>> {
    if let Some(path) = &config.bundle_path {
        return load_bundles_from_file(path);
    }
    if config.use_bundle_from_registry {
        return fetch_from_registry(registry, artifact).await;
    }
    fetch_from_api(config, api, artifact).await
}

async fn fetch_from_registry(
    registry: &dyn RegistryClient,
    artifact: &DigestedArtifact,
) -> Result<Vec<Attestation>> {
    let Some(reference) = &artifact.name_ref else {
        return Err(Error::NotAnOciReference);
    };
    let bundles = registry
        .get_attestations(reference, &artifact.digest_with_alg())
        .await?;
    if bundles.is_empty() {
        return Err(Error::RegistryEmpty);
    }
    Ok(bundles
        .into_iter()
        .map(|bundle| Attestation {
            bundle,
            bundle_url: None,
        })
        .collect())
}

async fn fetch_from_api(
    config: &FetchConfig,
    api: &dyn AttestationsClient,
    artifact: &DigestedArtifact,
) -> Result<Vec<Attestation>> {
    let digest = artifact.digest_with_alg();
    // Repo wins when both are configured; the owner value is derived from
    // the repo in that case anyway.
    if let Some(repo) = &config.repo {
        return api.get_by_repo_and_digest(repo, &digest, config.limit).await;
    }
    if let Some(owner) = &config.owner {
        return api
            .get_by_owner_and_digest(owner, &digest, config.limit)
            .await;
    }
    Err(Error::MissingSubjectScope)
}
