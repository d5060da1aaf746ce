//! Verification policy construction.
//!
//! A [`VerifyPolicy`] pins the artifact digest and constrains the
//! signing certificate: which identity signed (subject alternative
//! name), which OIDC issuer vouched for it, and optionally which
//! runner environment produced the signature.

use provenance_artifact::DigestedArtifact;
use provenance_types::HashAlgorithm;
use regex::Regex;

use crate::error::{Error, Result};

/// OIDC issuer for workflows running on github.com.
pub const GITHUB_OIDC_ISSUER: &str = "https://token.actions.githubusercontent.com";

/// Runner environment reported for GitHub-managed runners.
pub const GITHUB_HOSTED_RUNNER: &str = "github-hosted";

/// Predicate type of SLSA v1 provenance statements.
pub const SLSA_PREDICATE_V1: &str = "https://slsa.dev/provenance/v1";

/// Constraint on the certificate's subject alternative name.
#[derive(Debug, Clone)]
pub enum SanMatcher {
    /// Accept any identity.
    Any,
    /// Exact string match.
    Exact(String),
    /// Anchored regular expression match.
    Regex(Regex),
}

impl SanMatcher {
    pub fn matches(&self, san: &str) -> bool {
        match self {
            SanMatcher::Any => true,
            SanMatcher::Exact(want) => want == san,
            SanMatcher::Regex(re) => re.is_match(san),
        }
    }
}

/// A fully-built policy, ready to evaluate against bundles.
#[derive(Debug, Clone)]
pub struct VerifyPolicy {
    pub digest_algorithm: HashAlgorithm,
    pub hex_digest: String,
    pub san: SanMatcher,
    pub oidc_issuer: String,
    /// When set, the certificate's runner environment must equal this.
    pub runner_environment: Option<String>,
}

/// Builder mirroring the knobs a caller can turn before verification.
///
/// The artifact digest is decoded up front so a malformed digest fails
/// before any network or crypto work happens.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    digest_algorithm: HashAlgorithm,
    hex_digest: String,
    san: Option<String>,
    san_regex: Option<String>,
    oidc_issuer: String,
    deny_self_hosted: bool,
}

impl PolicyBuilder {
    pub fn new(artifact: &DigestedArtifact) -> Result<Self> {
        let decoded = hex::decode(&artifact.digest)
            .map_err(|_| Error::InvalidDigest(artifact.digest.clone()))?;
        if decoded.len() != artifact.algorithm.digest_len() {
            return Err(Error::InvalidDigest(artifact.digest.clone()));
        }
        Ok(Self {
            digest_algorithm: artifact.algorithm,
            hex_digest: artifact.digest.clone(),
            san: None,
            san_regex: None,
            oidc_issuer: GITHUB_OIDC_ISSUER.to_string(),
            deny_self_hosted: false,
        })
    }

    /// Requires the certificate identity to equal `san` exactly.
    pub fn san(mut self, san: impl Into<String>) -> Self {
        self.san = Some(san.into());
        self
    }

    /// Requires the certificate identity to match `pattern`.
    pub fn san_regex(mut self, pattern: impl Into<String>) -> Self {
        self.san_regex = Some(pattern.into());
        self
    }

    /// Constrains the identity to workflows of `repo` ("owner/name").
    ///
    /// Expands to a case-insensitive prefix match on the host serving
    /// the repository. An explicit [`san_regex`](Self::san_regex) wins
    /// over this expansion.
    pub fn signer_repo(mut self, tenant: Option<&str>, repo: &str) -> Self {
        if self.san_regex.is_none() && self.san.is_none() {
            self.san_regex = Some(expand_to_github_url(tenant, repo));
        }
        self
    }

    /// Constrains the identity to one workflow file, given as
    /// "owner/repo/path/to/workflow.yml" relative to `host`.
    pub fn signer_workflow(mut self, host: &str, workflow: &str) -> Result<Self> {
        let pattern = validate_signer_workflow(host, workflow)?;
        self.san_regex = Some(pattern);
        Ok(self)
    }

    pub fn oidc_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.oidc_issuer = issuer.into();
        self
    }

    /// Rejects attestations signed on self-hosted runners.
    pub fn deny_self_hosted_runners(mut self) -> Self {
        self.deny_self_hosted = true;
        self
    }

    pub fn build(self) -> Result<VerifyPolicy> {
        let san = match (self.san, self.san_regex) {
            (Some(_), Some(_)) => {
                return Err(Error::Policy(
                    "a certificate identity and a certificate identity regex are mutually exclusive".into(),
                ))
            }
            (Some(exact), None) => SanMatcher::Exact(exact),
            (None, Some(pattern)) => {
                let re = Regex::new(&pattern).map_err(|e| {
                    Error::Policy(format!("invalid certificate identity regex: {e}"))
                })?;
                SanMatcher::Regex(re)
            }
            (None, None) => SanMatcher::Any,
        };
        Ok(VerifyPolicy {
            digest_algorithm: self.digest_algorithm,
            hex_digest: self.hex_digest,
            san,
            oidc_issuer: self.oidc_issuer,
            runner_environment: self
                .deny_self_hosted
                .then(|| GITHUB_HOSTED_RUNNER.to_string()),
        })
    }
}

/// Case-insensitive identity prefix for a repository or owner on
/// github.com, or on a tenant's `ghe.com` domain when one is set.
pub fn expand_to_github_url(tenant: Option<&str>, owner_or_repo: &str) -> String {
    match tenant {
        None | Some("") => format!("(?i)^https://github.com/{owner_or_repo}/"),
        Some(tenant) => format!("(?i)^https://{tenant}.ghe.com/{owner_or_repo}/"),
    }
}

/// Validates a "[host/]owner/repo/path" workflow reference and anchors
/// it to a host. A leading segment containing a dot is taken as the
/// host; otherwise `host` is substituted, and an empty one cannot be
/// turned into a URL.
pub fn validate_signer_workflow(host: &str, workflow: &str) -> Result<String> {
    let segments: Vec<&str> = workflow.splitn(4, '/').collect();
    if segments.first().is_some_and(|first| first.contains('.')) {
        if segments.len() < 4 || segments.iter().any(|s| s.is_empty()) {
            return Err(Error::Policy(format!(
                "unable to parse signer workflow: {workflow}"
            )));
        }
        return Ok(format!("^https://{workflow}"));
    }
    if segments.len() < 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(Error::Policy(format!(
            "unable to parse signer workflow: {workflow}"
        )));
    }
    if host.is_empty() {
        return Err(Error::UnknownHost);
    }
    Ok(format!("^https://{host}/{workflow}"))
}
