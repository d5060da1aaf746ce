//! TUF-backed target retrieval
//!
//! Trusted roots are distributed through TUF repositories: the Sigstore
//! public good mirror and GitHub's own. A freshly cached target inside the
//! validity window is served without touching the network; otherwise the
//! repository metadata is re-verified against the embedded root of trust
//! and the target re-fetched.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tough::{HttpTransport, IntoVec, RepositoryLoader, TargetName};
use url::Url;

/// Sigstore public good TUF repository URL
pub const PUBLIC_GOOD_TUF_URL: &str = "https://tuf-repo-cdn.sigstore.dev";

/// GitHub TUF repository URL
pub const GITHUB_TUF_URL: &str = "https://tuf-repo.github.com";

/// TUF target name for the trusted root
pub const TRUSTED_ROOT_TARGET: &str = "trusted_root.json";

/// Embedded root.json bootstrapping trust in the public good repository
pub const PUBLIC_GOOD_TUF_ROOT: &[u8] = include_bytes!("../repository/sigstore_root.json");

/// Embedded root.json bootstrapping trust in GitHub's repository
pub const GITHUB_TUF_ROOT: &[u8] = include_bytes!("../repository/github_root.json");

const DEFAULT_CACHE_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for a TUF repository connection
#[derive(Debug, Clone)]
pub struct TufOptions {
    /// Base URL of the TUF repository
    pub repository_base_url: String,
    /// root.json used to bootstrap trust, obtained out-of-band
    pub root: Vec<u8>,
    /// How long cached targets are served without a network refresh;
    /// zero forces a full refresh on every fetch
    pub cache_validity: Duration,
    /// Skip the on-disk cache entirely, for read-only filesystems
    pub disable_local_cache: bool,
    /// Cache directory override; a platform-specific default otherwise
    pub cache_dir: Option<PathBuf>,
}

impl TufOptions {
    /// Options for the Sigstore public good repository
    pub fn public_good() -> Self {
        Self {
            repository_base_url: PUBLIC_GOOD_TUF_URL.to_string(),
            root: PUBLIC_GOOD_TUF_ROOT.to_vec(),
            cache_validity: DEFAULT_CACHE_VALIDITY,
            disable_local_cache: false,
            cache_dir: None,
        }
    }

    /// Options for GitHub's repository
    pub fn github() -> Self {
        Self {
            repository_base_url: GITHUB_TUF_URL.to_string(),
            root: GITHUB_TUF_ROOT.to_vec(),
            cache_validity: DEFAULT_CACHE_VALIDITY,
            disable_local_cache: false,
            cache_dir: None,
        }
    }

    /// Options for a mirror the caller bootstrapped out-of-band
    pub fn custom(repository_base_url: String, root: Vec<u8>) -> Self {
        Self {
            repository_base_url,
            root,
            cache_validity: DEFAULT_CACHE_VALIDITY,
            disable_local_cache: false,
            cache_dir: None,
        }
    }

    /// Set the cache validity window
    pub fn with_cache_validity(mut self, validity: Duration) -> Self {
        self.cache_validity = validity;
        self
    }

    /// Disable the on-disk cache
    pub fn without_local_cache(mut self) -> Self {
        self.disable_local_cache = true;
        self
    }

    /// Set the cache directory
    pub fn with_cache_dir(mut self, path: PathBuf) -> Self {
        self.cache_dir = Some(path);
        self
    }

    fn resolve_cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let project_dirs = directories::ProjectDirs::from("rs", "provenance", "provenance")
            .ok_or_else(|| Error::Tuf("could not determine cache directory".into()))?;
        // Separate caches per repository host so mirrors never collide
        let host = Url::parse(&self.repository_base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        Ok(project_dirs.cache_dir().join("tuf").join(host))
    }
}

/// Narrow capability for fetching verified TUF targets
#[async_trait]
pub trait TufClient: Send + Sync {
    async fn get_target(&self, name: &str) -> Result<Vec<u8>>;
}

/// tough-backed TUF client with a cache validity window
pub struct ToughTufClient {
    options: TufOptions,
}

impl ToughTufClient {
    pub fn new(options: TufOptions) -> Self {
        Self { options }
    }

    /// Serve the cached copy of a target if it is inside the validity window
    fn fresh_cached_target(&self, name: &str) -> Option<Vec<u8>> {
        if self.options.disable_local_cache || self.options.cache_validity.is_zero() {
            return None;
        }
        let path = self.cached_target_path(name)?;
        let metadata = std::fs::metadata(&path).ok()?;
        let modified = metadata.modified().ok()?;
        let age = SystemTime::now().duration_since(modified).ok()?;
        if age < self.options.cache_validity {
            tracing::debug!(target = name, "serving cached TUF target");
            std::fs::read(&path).ok()
        } else {
            None
        }
    }

    fn cached_target_path(&self, name: &str) -> Option<PathBuf> {
        let dir = self.options.resolve_cache_dir().ok()?;
        Some(dir.join("targets").join(name))
    }

    async fn fetch_target(&self, name: &str) -> Result<Vec<u8>> {
        let base_url = Url::parse(&self.options.repository_base_url)
            .map_err(|e| Error::Tuf(e.to_string()))?;
        let metadata_url = base_url.clone();
        let targets_url = base_url
            .join("targets/")
            .map_err(|e| Error::Tuf(e.to_string()))?;

        let mut loader = RepositoryLoader::new(&self.options.root, metadata_url, targets_url)
            .transport(HttpTransport::default());

        if !self.options.disable_local_cache {
            let cache_dir = self.options.resolve_cache_dir()?;
            tokio::fs::create_dir_all(&cache_dir)
                .await
                .map_err(|e| Error::Tuf(format!("failed to create cache directory: {e}")))?;
            loader = loader.datastore(cache_dir);
        }

        let repo = loader
            .load()
            .await
            .map_err(|e| Error::Tuf(format!("TUF repository load failed: {e}")))?;

        let target =
            TargetName::new(name).map_err(|e| Error::Tuf(format!("invalid target name: {e}")))?;
        let stream = repo
            .read_target(&target)
            .await
            .map_err(|e| Error::Tuf(format!("failed to read target: {e}")))?
            .ok_or_else(|| Error::Tuf(format!("target not found: {name}")))?;
        let bytes = stream
            .into_vec()
            .await
            .map_err(|e| Error::Tuf(format!("failed to read target contents: {e}")))?;

        if !self.options.disable_local_cache {
            self.store_cached_target(name, &bytes).await;
        }
        Ok(bytes)
    }

    async fn store_cached_target(&self, name: &str, bytes: &[u8]) {
        let Some(path) = self.cached_target_path(name) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!("failed to create target cache directory: {e}");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            tracing::warn!("failed to cache TUF target: {e}");
        }
    }
}

#[async_trait]
impl TufClient for ToughTufClient {
    async fn get_target(&self, name: &str) -> Result<Vec<u8>> {
        if let Some(cached) = self.fresh_cached_target(name) {
            return Ok(cached);
        }
        self.fetch_target(name).await
    }
}
