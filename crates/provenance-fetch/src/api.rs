//! Attestations API client
//!
//! Fetches attestation bundles stored alongside a repository or organization,
//! keyed by artifact digest. Pagination follows the `Link` header; transient
//! server errors are retried a fixed number of times.

use crate::error::{Error, Result};
use async_trait::async_trait;
use provenance_types::Bundle;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of attestations fetched when the caller does not set a limit
pub const DEFAULT_LIMIT: usize = 30;

const MAX_LIMIT: usize = 1000;
const MAX_PAGE_SIZE: usize = 100;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// An attestation as returned by the API: a bundle plus its storage URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub bundle: Bundle,
    // The API spells this one field in snake_case.
    #[serde(
        rename = "bundle_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bundle_url: Option<String>,
}

/// Attestation lookup operations needed by the fetch flow
#[async_trait]
pub trait AttestationsClient: Send + Sync {
    /// Fetch attestations for a digest scoped to a repository
    async fn get_by_repo_and_digest(
        &self,
        repo: &str,
        digest: &str,
        limit: usize,
    ) -> Result<Vec<Attestation>>;

    /// Fetch attestations for a digest scoped to an organization
    async fn get_by_owner_and_digest(
        &self,
        owner: &str,
        digest: &str,
        limit: usize,
    ) -> Result<Vec<Attestation>>;

    /// Read the tenant's trust domain from the meta endpoint; empty on
    /// non-tenant hosts
    async fn get_trust_domain(&self) -> Result<String>;
}

/// One page of attestations plus the cursor to the next page, if any
#[derive(Debug, Default)]
pub struct AttestationsPage {
    pub attestations: Vec<Attestation>,
    pub next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetaResponse {
    #[serde(default)]
    pub domains: MetaDomains,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetaDomains {
    #[serde(default)]
    pub artifact_attestations: ArtifactAttestationsDomain,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtifactAttestationsDomain {
    #[serde(default)]
    pub trust_domain: String,
}

/// HTTP-level operations the live client runs on, separated so pagination
/// can be exercised against canned pages
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get_page(&self, url: &str) -> Result<AttestationsPage>;
    async fn get_meta(&self, url: &str) -> Result<MetaResponse>;
}

/// Live client against the attestations REST API
pub struct LiveClient {
    transport: Box<dyn ApiTransport>,
    api_base: String,
}

impl LiveClient {
    /// Create a client for the given host, optionally authenticated
    pub fn new(host: &str, token: Option<String>) -> Self {
        Self::with_transport(host, Box::new(HttpApiTransport::new(token)))
    }

    /// Create a client with a custom transport
    pub fn with_transport(host: &str, transport: Box<dyn ApiTransport>) -> Self {
        let api_base = if host == "github.com" {
            "https://api.github.com".to_string()
        } else {
            format!("https://api.{host}")
        };
        Self {
            transport,
            api_base,
        }
    }

    /// Build the repo-scoped lookup path, tolerating stray slashes in the
    /// repo name
    pub fn build_repo_and_digest_path(repo: &str, digest: &str) -> String {
        format!("repos/{}/attestations/{digest}", repo.trim_matches('/'))
    }

    /// Build the org-scoped lookup path
    pub fn build_owner_and_digest_path(owner: &str, digest: &str) -> String {
        format!("orgs/{}/attestations/{digest}", owner.trim_matches('/'))
    }

    async fn collect(&self, path: &str, digest: &str, limit: usize) -> Result<Vec<Attestation>> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::InvalidLimit(limit));
        }
        let per_page = limit.min(MAX_PAGE_SIZE);
        let mut url = format!("{}/{path}?per_page={per_page}", self.api_base);
        let mut collected: Vec<Attestation> = Vec::new();

        loop {
            tracing::debug!(%url, "fetching attestations page");
            let page = self.transport.get_page(&url).await?;
            collected.extend(page.attestations);
            if collected.len() >= limit {
                collected.truncate(limit);
                break;
            }
            match page.next_url {
                Some(next) => url = next,
                None => break,
            }
        }

        if collected.is_empty() {
            return Err(Error::NoAttestations {
                subject: digest.to_string(),
            });
        }
        Ok(collected)
    }
}

#[async_trait]
impl AttestationsClient for LiveClient {
    async fn get_by_repo_and_digest(
        &self,
        repo: &str,
        digest: &str,
        limit: usize,
    ) -> Result<Vec<Attestation>> {
        let path = Self::build_repo_and_digest_path(repo, digest);
        self.collect(&path, digest, limit).await
    }

    async fn get_by_owner_and_digest(
        &self,
        owner: &str,
        digest: &str,
        limit: usize,
    ) -> Result<Vec<Attestation>> {
        let path = Self::build_owner_and_digest_path(owner, digest);
        self.collect(&path, digest, limit).await
    }

    async fn get_trust_domain(&self) -> Result<String> {
        let url = format!("{}/meta", self.api_base);
        let meta = self.transport.get_meta(&url).await?;
        Ok(meta.domains.artifact_attestations.trust_domain)
    }
}

#[derive(Debug, Deserialize)]
struct AttestationsBody {
    #[serde(default)]
    attestations: Vec<Attestation>,
}

/// reqwest-backed transport with fixed-backoff retry on server errors
pub struct HttpApiTransport {
    http: reqwest::Client,
    token: Option<String>,
}

impl HttpApiTransport {
    pub fn new(token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let http = &self.http;
        let token = self.token.as_deref();
        retry_on_server_error(url, move || {
            let mut request = http
                .get(url)
                .header(reqwest::header::ACCEPT, "application/vnd.github+json");
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
            async move {
                let response = request.send().await.map_err(|e| Error::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
                Ok((response.status().as_u16(), response))
            }
        })
        .await
    }
}

/// Run one request attempt at a time until it succeeds, retrying server
/// errors a bounded number of times with a fixed backoff. Client errors
/// will not change on retry and fail immediately.
async fn retry_on_server_error<T, F, Fut>(url: &str, mut send: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(u16, T)>>,
{
    let mut attempt = 1;
    loop {
        let (status, value) = send().await?;
        if (200..300).contains(&status) {
            return Ok(value);
        }
        if (500..600).contains(&status) && attempt < MAX_ATTEMPTS {
            tracing::debug!(%url, status, attempt, "retrying request");
            tokio::time::sleep(RETRY_BACKOFF).await;
            attempt += 1;
            continue;
        }
        return Err(Error::Api {
            url: url.to_string(),
            status,
        });
    }
}

#[async_trait]
impl ApiTransport for HttpApiTransport {
    async fn get_page(&self, url: &str) -> Result<AttestationsPage> {
        let response = self.get_with_retry(url).await?;
        let next_url = next_page_url(response.headers());
        let body: AttestationsBody = response.json().await.map_err(|e| Error::Transport {
            url: url.to_string(),
            reason: format!("failed to decode attestations page: {e}"),
        })?;
        Ok(AttestationsPage {
            attestations: body.attestations,
            next_url,
        })
    }

    async fn get_meta(&self, url: &str) -> Result<MetaResponse> {
        let response = self.get_with_retry(url).await?;
        response.json().await.map_err(|e| Error::Transport {
            url: url.to_string(),
            reason: format!("failed to decode meta response: {e}"),
        })
    }
}

/// Extract the `rel="next"` target from a `Link` header, if present
fn next_page_url(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let link = headers.get(reqwest::header::LINK)?.to_str().ok()?;
    for part in link.split(',') {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments
            .any(|s| s.trim() == "rel=\"next\"" || s.trim() == "rel=next");
        if is_next {
            return Some(
                target
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string(),
            );
        }
    }
    None
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    pub fn sample_attestation(predicate_type: &str) -> Attestation {
        let statement = format!(
            r#"{{"_type":"https://in-toto.io/Statement/v1","subject":[],"predicateType":"{predicate_type}","predicate":{{}}}}"#
        );
        let payload = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            statement.as_bytes(),
        );
        let json = format!(
            r#"{{
              "bundle": {{
                "mediaType": "application/vnd.dev.sigstore.bundle.v0.3+json",
                "verificationMaterial": {{
                  "certificate": {{"rawBytes": "MIIB"}}
                }},
                "dsseEnvelope": {{
                  "payloadType": "application/vnd.in-toto+json",
                  "payload": "{payload}",
                  "signatures": [{{"sig": "c2ln"}}]
                }}
              }},
              "bundle_url": "https://example.com/bundle"
            }}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    /// Transport serving a fixed number of attestations per page, with an
    /// optional second page
    pub struct MockTransport {
        per_page: usize,
        has_next_page: bool,
    }

    impl MockTransport {
        pub fn new(per_page: usize, has_next_page: bool) -> Self {
            Self {
                per_page,
                has_next_page,
            }
        }
    }

    #[async_trait]
    impl ApiTransport for MockTransport {
        async fn get_page(&self, url: &str) -> Result<AttestationsPage> {
            let attestations = (0..self.per_page)
                .map(|_| sample_attestation("https://slsa.dev/provenance/v1"))
                .collect();
            let next_url = if self.has_next_page && !url.contains("page=2") {
                Some(format!("{url}&page=2"))
            } else {
                None
            };
            Ok(AttestationsPage {
                attestations,
                next_url,
            })
        }

        async fn get_meta(&self, _url: &str) -> Result<MetaResponse> {
            Ok(MetaResponse {
                domains: MetaDomains {
                    artifact_attestations: ArtifactAttestationsDomain {
                        trust_domain: "foo".to_string(),
                    },
                },
            })
        }
    }

    fn client(per_page: usize, has_next_page: bool) -> LiveClient {
        LiveClient::with_transport(
            "github.com",
            Box::new(MockTransport::new(per_page, has_next_page)),
        )
    }

    #[test]
    fn test_build_paths() {
        assert_eq!(
            LiveClient::build_repo_and_digest_path("/github/example/", "sha256:12313213"),
            "repos/github/example/attestations/sha256:12313213"
        );
        assert_eq!(
            LiveClient::build_repo_and_digest_path("github/example", "sha256:12313213"),
            "repos/github/example/attestations/sha256:12313213"
        );
        assert_eq!(
            LiveClient::build_owner_and_digest_path("github", "sha256:12313213"),
            "orgs/github/attestations/sha256:12313213"
        );
    }

    #[tokio::test]
    async fn test_get_by_digest() {
        let c = client(5, false);
        let attestations = c
            .get_by_repo_and_digest("github/example", "sha256:12313213", DEFAULT_LIMIT)
            .await
            .unwrap();
        assert_eq!(attestations.len(), 5);
        assert_eq!(
            attestations[0].bundle.media_type,
            "application/vnd.dev.sigstore.bundle.v0.3+json"
        );

        let attestations = c
            .get_by_owner_and_digest("github", "sha256:12313213", DEFAULT_LIMIT)
            .await
            .unwrap();
        assert_eq!(attestations.len(), 5);
    }

    #[tokio::test]
    async fn test_limit_truncates_results() {
        let c = client(5, false);
        let attestations = c
            .get_by_repo_and_digest("github/example", "sha256:12313213", 3)
            .await
            .unwrap();
        assert_eq!(attestations.len(), 3);
    }

    #[tokio::test]
    async fn test_pagination_follows_next_link() {
        let c = client(5, true);
        let attestations = c
            .get_by_repo_and_digest("github/example", "sha256:12313213", DEFAULT_LIMIT)
            .await
            .unwrap();
        assert_eq!(attestations.len(), 10);
    }

    #[tokio::test]
    async fn test_pagination_stops_at_limit() {
        let c = client(5, true);
        let attestations = c
            .get_by_repo_and_digest("github/example", "sha256:12313213", 7)
            .await
            .unwrap();
        assert_eq!(attestations.len(), 7);
    }

    #[tokio::test]
    async fn test_limit_bounds_checked_before_io() {
        let c = client(5, false);
        for limit in [0, 1001] {
            let err = c
                .get_by_repo_and_digest("github/example", "sha256:12313213", limit)
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("limit {limit} not allowed, must be between 1 and 1000")
            );
        }
    }

    #[tokio::test]
    async fn test_empty_response_is_no_attestations() {
        let c = client(0, false);
        let err = c
            .get_by_repo_and_digest("github/example", "sha256:12313213", DEFAULT_LIMIT)
            .await
            .unwrap_err();
        assert!(err.is_no_attestations());
    }

    #[tokio::test]
    async fn test_get_trust_domain() {
        let c = client(5, false);
        assert_eq!(c.get_trust_domain().await.unwrap(), "foo");
    }

    #[test]
    fn test_bundle_url_uses_snake_case_wire_name() {
        let attestation = sample_attestation("https://slsa.dev/provenance/v1");
        assert_eq!(
            attestation.bundle_url.as_deref(),
            Some("https://example.com/bundle")
        );
        let json = serde_json::to_value(&attestation).unwrap();
        assert!(json.get("bundle_url").is_some());
        assert!(json.get("bundleUrl").is_none());
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let attempts = AtomicU32::new(0);
        let err = retry_on_server_error("https://api.github.com/x", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok((503u16, ())) }
        })
        .await
        .unwrap_err();
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert!(matches!(err, Error::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_client_error_fails_without_retry() {
        let attempts = AtomicU32::new(0);
        let err = retry_on_server_error("https://api.github.com/x", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok((404u16, ())) }
        })
        .await
        .unwrap_err();
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(err, Error::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_server_error() {
        let attempts = AtomicU32::new(0);
        let body = retry_on_server_error("https://api.github.com/x", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok((500u16, "unused"))
                } else {
                    Ok((200u16, "page"))
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(body, "page");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_next_page_url() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            "<https://api.github.com/x?page=2>; rel=\"next\", <https://api.github.com/x?page=5>; rel=\"last\""
                .parse()
                .unwrap(),
        );
        assert_eq!(
            next_page_url(&headers),
            Some("https://api.github.com/x?page=2".to_string())
        );

        let empty = reqwest::header::HeaderMap::new();
        assert_eq!(next_page_url(&empty), None);
    }
}
