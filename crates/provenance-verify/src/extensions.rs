//! Enforcement of certificate extension claims after signature
//! verification.
//!
//! Signature verification proves who signed; these checks prove the
//! signer is the repository, owner, and OIDC issuer the caller asked
//! about. URI comparisons are case-insensitive because GitHub treats
//! owner and repository names case-insensitively; issuer comparison is
//! exact.

use crate::certificate::CertificateSummary;
use crate::error::{Error, Result};
use crate::policy::{VerifyPolicy, GITHUB_OIDC_ISSUER};
use crate::results::AttestationProcessingResult;

/// Expected values for the certificate extension checks.
#[derive(Debug, Clone, Default)]
pub struct ExtensionCriteria {
    /// Tenant name for `ghe.com` domains, when verifying against one.
    pub tenant: Option<String>,
    /// Expected repository owner; skipped when empty.
    pub owner: String,
    /// Expected "owner/name" repository; skipped when empty.
    pub repo: String,
    /// Expected OIDC issuer.
    pub issuer: String,
}

impl ExtensionCriteria {
    /// Criteria scoped to `owner` and `repo`, expecting the issuer the
    /// policy was built with.
    pub fn for_policy(
        policy: &VerifyPolicy,
        tenant: Option<&str>,
        owner: &str,
        repo: &str,
    ) -> Self {
        Self {
            tenant: tenant.map(str::to_string),
            owner: owner.to_string(),
            repo: repo.to_string(),
            issuer: policy.oidc_issuer.clone(),
        }
    }
}

/// Checks every result's certificate against `criteria`, stopping at
/// the first mismatch.
pub fn verify_cert_extensions(
    results: &[AttestationProcessingResult],
    criteria: &ExtensionCriteria,
) -> Result<()> {
    if results.is_empty() {
        return Err(Error::Verification(
            "no attestations to check certificate extensions on".into(),
        ));
    }
    for result in results {
        verify_extensions(&result.verification_result.certificate, criteria)?;
    }
    Ok(())
}

fn verify_extensions(certificate: &CertificateSummary, criteria: &ExtensionCriteria) -> Result<()> {
    let tenant = criteria.tenant.as_deref().filter(|t| !t.is_empty());

    if !criteria.owner.is_empty() {
        let expected = owner_uri(tenant, &criteria.owner);
        if !expected.eq_ignore_ascii_case(&certificate.source_repository_owner_uri) {
            return Err(Error::ExtensionMismatch {
                field: "SourceRepositoryOwnerURI",
                expected,
                actual: certificate.source_repository_owner_uri.clone(),
            });
        }
    }

    if !criteria.repo.is_empty() {
        let expected = owner_uri(tenant, &criteria.repo);
        if !expected.eq_ignore_ascii_case(&certificate.source_repository_uri) {
            return Err(Error::ExtensionMismatch {
                field: "SourceRepositoryURI",
                expected,
                actual: certificate.source_repository_uri.clone(),
            });
        }
    }

    let expected_issuer = match tenant {
        // A tenant keeps the default issuer on its own domain.
        Some(tenant) if criteria.issuer == GITHUB_OIDC_ISSUER => {
            format!("https://token.actions.{tenant}.ghe.com")
        }
        _ => criteria.issuer.clone(),
    };
    if certificate.issuer != expected_issuer {
        // Only a true path extension of the expected issuer earns the
        // enterprise-policy hint; a look-alike host does not.
        if certificate.issuer.starts_with(&format!("{expected_issuer}/")) {
            return Err(Error::IssuerMismatch {
                expected: expected_issuer,
                actual: certificate.issuer.clone(),
            });
        }
        return Err(Error::ExtensionMismatch {
            field: "Issuer",
            expected: expected_issuer,
            actual: certificate.issuer.clone(),
        });
    }

    Ok(())
}

fn owner_uri(tenant: Option<&str>, owner_or_repo: &str) -> String {
    match tenant {
        None => format!("https://github.com/{owner_or_repo}"),
        Some(tenant) => format!("https://{tenant}.ghe.com/{owner_or_repo}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> CertificateSummary {
        CertificateSummary {
            subject_alternative_name:
                "https://github.com/acme/app/.github/workflows/ci.yml@refs/heads/main".into(),
            issuer: GITHUB_OIDC_ISSUER.into(),
            build_signer_uri:
                "https://github.com/acme/app/.github/workflows/ci.yml@refs/heads/main".into(),
            runner_environment: "github-hosted".into(),
            source_repository_uri: "https://github.com/acme/app".into(),
            source_repository_owner_uri: "https://github.com/acme".into(),
        }
    }

    fn criteria(owner: &str, repo: &str) -> ExtensionCriteria {
        ExtensionCriteria {
            tenant: None,
            owner: owner.into(),
            repo: repo.into(),
            issuer: GITHUB_OIDC_ISSUER.into(),
        }
    }

    #[test]
    fn test_criteria_from_policy_enforces_policy_issuer() {
        use crate::policy::SanMatcher;
        use provenance_types::HashAlgorithm;

        let policy = VerifyPolicy {
            digest_algorithm: HashAlgorithm::Sha256,
            hex_digest: "00".repeat(32),
            san: SanMatcher::Any,
            oidc_issuer: "https://token.actions.example.com".into(),
            runner_environment: None,
        };
        let crit = ExtensionCriteria::for_policy(&policy, None, "acme", "acme/app");
        assert_eq!(crit.issuer, "https://token.actions.example.com");

        let err = verify_extensions(&summary(), &crit).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "expected Issuer to be https://token.actions.example.com, got {GITHUB_OIDC_ISSUER}"
            )
        );
    }

    #[test]
    fn test_owner_and_repo_match() {
        verify_extensions(&summary(), &criteria("acme", "acme/app")).unwrap();
    }

    #[test]
    fn test_owner_comparison_is_case_insensitive() {
        verify_extensions(&summary(), &criteria("ACME", "Acme/App")).unwrap();
    }

    #[test]
    fn test_wrong_owner_is_reported() {
        let err = verify_extensions(&summary(), &criteria("wrong", "")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected SourceRepositoryOwnerURI to be https://github.com/wrong, got https://github.com/acme"
        );
    }

    #[test]
    fn test_wrong_repo_is_reported() {
        let err = verify_extensions(&summary(), &criteria("acme", "acme/other")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected SourceRepositoryURI to be https://github.com/acme/other, got https://github.com/acme/app"
        );
    }

    #[test]
    fn test_repo_check_skipped_when_not_supplied() {
        verify_extensions(&summary(), &criteria("acme", "")).unwrap();
    }

    #[test]
    fn test_tenant_expects_ghe_owner_uri() {
        let mut cert = summary();
        cert.source_repository_owner_uri = "https://foo.ghe.com/acme".into();
        cert.source_repository_uri = "https://foo.ghe.com/acme/app".into();
        cert.issuer = "https://token.actions.foo.ghe.com".into();
        let crit = ExtensionCriteria {
            tenant: Some("foo".into()),
            owner: "acme".into(),
            repo: "acme/app".into(),
            issuer: GITHUB_OIDC_ISSUER.into(),
        };
        verify_extensions(&cert, &crit).unwrap();
    }

    #[test]
    fn test_tenant_rejects_dotcom_owner_uri() {
        let crit = ExtensionCriteria {
            tenant: Some("foo".into()),
            owner: "acme".into(),
            repo: String::new(),
            issuer: GITHUB_OIDC_ISSUER.into(),
        };
        let err = verify_extensions(&summary(), &crit).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected SourceRepositoryOwnerURI to be https://foo.ghe.com/acme, got https://github.com/acme"
        );
    }

    #[test]
    fn test_tenant_substitutes_default_issuer() {
        let mut cert = summary();
        cert.source_repository_owner_uri = "https://foo.ghe.com/acme".into();
        // Issuer still points at github.com; with a tenant the expected
        // issuer moves to the tenant domain.
        let crit = ExtensionCriteria {
            tenant: Some("foo".into()),
            owner: "acme".into(),
            repo: String::new(),
            issuer: GITHUB_OIDC_ISSUER.into(),
        };
        let err = verify_extensions(&cert, &crit).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("expected Issuer to be https://token.actions.foo.ghe.com, got https://token.actions.githubusercontent.com"));
    }

    #[test]
    fn test_tenant_keeps_custom_issuer() {
        let mut cert = summary();
        cert.source_repository_owner_uri = "https://foo.ghe.com/acme".into();
        cert.issuer = "https://custom.example.com".into();
        let crit = ExtensionCriteria {
            tenant: Some("foo".into()),
            owner: "acme".into(),
            repo: String::new(),
            issuer: "https://custom.example.com".into(),
        };
        verify_extensions(&cert, &crit).unwrap();
    }

    #[test]
    fn test_issuer_prefix_match_adds_hint() {
        let mut cert = summary();
        cert.issuer = format!("{GITHUB_OIDC_ISSUER}/enterprise-slug");
        let err = verify_extensions(&cert, &criteria("acme", "")).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(&format!(
            "expected Issuer to be {GITHUB_OIDC_ISSUER}, got {GITHUB_OIDC_ISSUER}/enterprise-slug"
        )));
        assert!(message.contains("custom OIDC issuer policy"));
    }

    #[test]
    fn test_issuer_hint_requires_path_separator() {
        // A host that merely extends the expected issuer's name is a
        // plain mismatch, not an enterprise path variant.
        let mut cert = summary();
        cert.issuer = format!("{GITHUB_OIDC_ISSUER}.evil.example");
        let err = verify_extensions(&cert, &criteria("acme", "")).unwrap_err();
        let message = err.to_string();
        assert!(!message.contains("custom OIDC issuer policy"));
        assert_eq!(
            message,
            format!("expected Issuer to be {GITHUB_OIDC_ISSUER}, got {GITHUB_OIDC_ISSUER}.evil.example")
        );
    }

    #[test]
    fn test_issuer_mismatch_without_hint() {
        let mut cert = summary();
        cert.issuer = "https://other.example.com".into();
        let err = verify_extensions(&cert, &criteria("acme", "")).unwrap_err();
        let message = err.to_string();
        assert_eq!(
            message,
            format!("expected Issuer to be {GITHUB_OIDC_ISSUER}, got https://other.example.com")
        );
    }

    #[test]
    fn test_issuer_comparison_is_exact() {
        let mut cert = summary();
        cert.issuer = GITHUB_OIDC_ISSUER.to_uppercase();
        assert!(verify_extensions(&cert, &criteria("acme", "")).is_err());
    }
}
