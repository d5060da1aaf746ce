//! Verifier selection keyed on the signing certificate's issuer.
//!
//! Each bundle names its issuing Sigstore instance implicitly through
//! the organization on the leaf certificate's issuer. Selection maps
//! that organization to a trusted root: a caller-supplied custom root
//! file when one is configured, otherwise the Public Good instance or
//! GitHub's instance distributed over TUF.

use std::path::PathBuf;

use async_trait::async_trait;
use provenance_fetch::Attestation;
use provenance_trust_root::{
    fetch_trusted_root, select_custom_root, sole_issuer_organization, ToughTufClient, TrustedRoot,
    TufClient, TufOptions, GITHUB_ISSUER_ORG, PUBLIC_GOOD_ISSUER_ORG,
};
use provenance_types::{Bundle, MediaType};

use crate::error::{Error, Result};
use crate::policy::VerifyPolicy;
use crate::results::AttestationProcessingResult;
use crate::verifier::{LiveVerifier, SignedEntityVerifier};

/// Knobs controlling which trust roots are acceptable.
#[derive(Debug, Clone, Default)]
pub struct SigstoreConfig {
    /// Path to a file of newline-delimited trusted root documents.
    /// When set, TUF distribution is bypassed entirely.
    pub custom_trusted_root: Option<PathBuf>,
    /// Refuse the Public Good instance even for bundles it issued.
    pub no_public_good: bool,
    /// Tenant trust domain qualifying the GitHub trusted root target.
    pub trust_domain: String,
}

/// Verifies a batch of attestations, all-or-nothing.
#[async_trait]
pub trait SigstoreVerifier: Send + Sync {
    /// Verifies every attestation against `policy`, in input order,
    /// stopping at the first failure.
    async fn verify(
        &self,
        attestations: &[Attestation],
        policy: &VerifyPolicy,
    ) -> Result<Vec<AttestationProcessingResult>>;
}

/// Production verifier resolving trusted roots over TUF.
pub struct LiveSigstoreVerifier {
    config: SigstoreConfig,
    public_good_tuf: Box<dyn TufClient>,
    github_tuf: Box<dyn TufClient>,
}

impl LiveSigstoreVerifier {
    pub fn new(config: SigstoreConfig) -> Self {
        Self {
            public_good_tuf: Box::new(ToughTufClient::new(TufOptions::public_good())),
            github_tuf: Box::new(ToughTufClient::new(TufOptions::github())),
            config,
        }
    }

    /// Injects the TUF clients, for tests and bespoke distributions.
    pub fn with_tuf_clients(
        config: SigstoreConfig,
        public_good_tuf: Box<dyn TufClient>,
        github_tuf: Box<dyn TufClient>,
    ) -> Self {
        Self {
            config,
            public_good_tuf,
            github_tuf,
        }
    }

    async fn choose_verifier(&self, bundle: &Bundle) -> Result<(LiveVerifier, String)> {
        if !bundle.min_version(MediaType::Bundle0_2) {
            return Err(Error::UnsupportedBundleVersion(bundle.media_type.clone()));
        }
        let leaf = bundle
            .signing_certificate()
            .ok_or(Error::MissingCertificate)?;
        let issuer = sole_issuer_organization(leaf.as_bytes())?;

        if let Some(path) = &self.config.custom_trusted_root {
            let roots = TrustedRoot::from_file(path)?;
            let root = select_custom_root(&roots, &issuer, self.config.no_public_good)?;
            return Ok((LiveVerifier::new(root.clone()), issuer));
        }

        if issuer == PUBLIC_GOOD_ISSUER_ORG && !self.config.no_public_good {
            let root = fetch_trusted_root(self.public_good_tuf.as_ref(), "").await?;
            Ok((LiveVerifier::new(root), issuer))
        } else if issuer == GITHUB_ISSUER_ORG || self.config.no_public_good {
            let root =
                fetch_trusted_root(self.github_tuf.as_ref(), &self.config.trust_domain).await?;
            Ok((LiveVerifier::new(root), issuer))
        } else {
            Err(Error::Verification(format!(
                "leaf certificate issuer is not recognized: {issuer}"
            )))
        }
    }
}

#[async_trait]
impl SigstoreVerifier for LiveSigstoreVerifier {
    async fn verify(
        &self,
        attestations: &[Attestation],
        policy: &VerifyPolicy,
    ) -> Result<Vec<AttestationProcessingResult>> {
        if attestations.is_empty() {
            return Err(Error::Verification("no attestations to verify".into()));
        }
        let mut results = Vec::with_capacity(attestations.len());
        for attestation in attestations {
            let (verifier, issuer) =
                self.choose_verifier(&attestation.bundle).await.map_err(|e| {
                    Error::Verification(format!(
                        "failed to find recognized issuer from bundle content: {e}"
                    ))
                })?;
            tracing::debug!(issuer = %issuer, "verifying attestation");
            let verification_result =
                verifier
                    .verify(&attestation.bundle, policy)
                    .map_err(|e| Error::VerifyFailed {
                        issuer: issuer.clone(),
                        reason: e.to_string(),
                    })?;
            results.push(AttestationProcessingResult {
                attestation: attestation.clone(),
                verification_result,
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::tests::LEAF_VALID_AT;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn leaf_b64() -> String {
        include_str!("testdata/fulcio_leaf.b64")
            .split_whitespace()
            .collect()
    }

    fn trusted_root_json() -> String {
        let intermediate: String = include_str!("testdata/sigstore_intermediate.b64")
            .split_whitespace()
            .collect();
        let root: String = include_str!("testdata/sigstore_root.b64")
            .split_whitespace()
            .collect();
        format!(
            r#"{{"certificateAuthorities":[{{"certChain":{{"certificates":[{{"rawBytes":"{intermediate}"}},{{"rawBytes":"{root}"}}]}}}}]}}"#
        )
    }

    /// v0.3 bundle carrying the real test leaf but a bogus envelope
    /// signature. Selection succeeds, cryptographic verification fails.
    fn leaf_attestation() -> Attestation {
        let leaf = leaf_b64();
        let json = format!(
            r#"{{
                "mediaType": "application/vnd.dev.sigstore.bundle.v0.3+json",
                "verificationMaterial": {{
                    "certificate": {{"rawBytes": "{leaf}"}},
                    "tlogEntries": [{{"logIndex": "1", "integratedTime": "{LEAF_VALID_AT}"}}]
                }},
                "dsseEnvelope": {{
                    "payloadType": "application/vnd.in-toto+json",
                    "payload": "e30=",
                    "signatures": [{{"sig": "bm90LWEtcmVhbC1zaWduYXR1cmU="}}]
                }}
            }}"#
        );
        Attestation {
            bundle: Bundle::from_json(&json).unwrap(),
            bundle_url: None,
        }
    }

    fn v01_attestation() -> Attestation {
        let leaf = leaf_b64();
        let json = format!(
            r#"{{
                "mediaType": "application/vnd.dev.sigstore.bundle+json;version=0.1",
                "verificationMaterial": {{
                    "x509CertificateChain": {{"certificates": [{{"rawBytes": "{leaf}"}}]}}
                }},
                "dsseEnvelope": {{
                    "payloadType": "application/vnd.in-toto+json",
                    "payload": "e30=",
                    "signatures": [{{"sig": "c2ln"}}]
                }}
            }}"#
        );
        Attestation {
            bundle: Bundle::from_json(&json).unwrap(),
            bundle_url: None,
        }
    }

    fn any_policy() -> VerifyPolicy {
        use provenance_artifact::DigestedArtifact;
        use provenance_types::HashAlgorithm;
        crate::policy::PolicyBuilder::new(&DigestedArtifact {
            url: "file://app.tgz".into(),
            digest: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9".into(),
            algorithm: HashAlgorithm::Sha256,
            name_ref: None,
        })
        .unwrap()
        .build()
        .unwrap()
    }

    struct MockTuf {
        response: String,
        requested: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl TufClient for MockTuf {
        async fn get_target(&self, name: &str) -> provenance_trust_root::Result<Vec<u8>> {
            self.requested.lock().unwrap().push(name.to_string());
            Ok(self.response.clone().into_bytes())
        }
    }

    fn custom_root_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_unsupported_bundle_version_is_reported() {
        let verifier = LiveSigstoreVerifier::new(SigstoreConfig::default());
        let err = verifier
            .verify(&[v01_attestation()], &any_policy())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("failed to find recognized issuer from bundle content"));
        assert!(message.contains("unsupported bundle version"));
        assert!(message.contains("version=0.1"));
    }

    #[tokio::test]
    async fn test_custom_root_rejects_disallowed_public_good() {
        let file = custom_root_file(&trusted_root_json());
        let verifier = LiveSigstoreVerifier::new(SigstoreConfig {
            custom_trusted_root: Some(file.path().to_path_buf()),
            no_public_good: true,
            trust_domain: String::new(),
        });
        let err = verifier
            .verify(&[leaf_attestation()], &any_policy())
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("verification against the public good instance was disallowed"));
    }

    #[tokio::test]
    async fn test_custom_root_failure_names_the_issuer() {
        // Selection succeeds against the matching custom root; the bogus
        // envelope signature then fails verification, and the error names
        // the issuer that was selected.
        let file = custom_root_file(&trusted_root_json());
        let verifier = LiveSigstoreVerifier::new(SigstoreConfig {
            custom_trusted_root: Some(file.path().to_path_buf()),
            ..SigstoreConfig::default()
        });
        let err = verifier
            .verify(&[leaf_attestation()], &any_policy())
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("verifying with issuer \"sigstore.dev\""));
    }

    #[tokio::test]
    async fn test_no_public_good_routes_to_tenant_github_root() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let github_tuf = Box::new(MockTuf {
            response: trusted_root_json(),
            requested: Arc::clone(&requested),
        });
        let public_good_tuf = Box::new(MockTuf {
            response: trusted_root_json(),
            requested: Arc::new(Mutex::new(Vec::new())),
        });
        let verifier = LiveSigstoreVerifier::with_tuf_clients(
            SigstoreConfig {
                custom_trusted_root: None,
                no_public_good: true,
                trust_domain: "foo".into(),
            },
            public_good_tuf,
            github_tuf,
        );
        // The leaf is issued by sigstore.dev, but with the public good
        // disallowed selection falls through to the GitHub root.
        let err = verifier
            .verify(&[leaf_attestation()], &any_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VerifyFailed { .. }));
        assert_eq!(
            requested.lock().unwrap().as_slice(),
            ["foo.trusted_root.json"]
        );
    }

    #[tokio::test]
    async fn test_public_good_root_serves_unqualified_target() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let public_good_tuf = Box::new(MockTuf {
            response: trusted_root_json(),
            requested: Arc::clone(&requested),
        });
        let github_tuf = Box::new(MockTuf {
            response: trusted_root_json(),
            requested: Arc::new(Mutex::new(Vec::new())),
        });
        let verifier = LiveSigstoreVerifier::with_tuf_clients(
            SigstoreConfig::default(),
            public_good_tuf,
            github_tuf,
        );
        let _ = verifier.verify(&[leaf_attestation()], &any_policy()).await;
        assert_eq!(requested.lock().unwrap().as_slice(), ["trusted_root.json"]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_an_error() {
        let verifier = LiveSigstoreVerifier::new(SigstoreConfig::default());
        let err = verifier.verify(&[], &any_policy()).await.unwrap_err();
        assert!(err.to_string().contains("no attestations to verify"));
    }

    /// Trait-level mock standing in for the cryptographic verifier, so
    /// downstream aggregation can be exercised without real signatures.
    struct MockSigstoreVerifier {
        certificate: crate::certificate::CertificateSummary,
    }

    #[async_trait]
    impl SigstoreVerifier for MockSigstoreVerifier {
        async fn verify(
            &self,
            attestations: &[Attestation],
            _policy: &VerifyPolicy,
        ) -> Result<Vec<AttestationProcessingResult>> {
            attestations
                .iter()
                .map(|attestation| {
                    let envelope = attestation.bundle.dsse_envelope().ok_or_else(|| {
                        Error::Verification("bundle does not contain a DSSE envelope".into())
                    })?;
                    let statement =
                        provenance_types::Statement::from_bytes(envelope.payload.as_bytes())?;
                    Ok(AttestationProcessingResult {
                        attestation: attestation.clone(),
                        verification_result: crate::verifier::VerificationResult {
                            statement,
                            certificate: self.certificate.clone(),
                        },
                    })
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn test_full_flow_with_mocked_crypto() {
        use crate::extensions::{verify_cert_extensions, ExtensionCriteria};
        use crate::policy::GITHUB_OIDC_ISSUER;
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;

        let statement = r#"{"_type":"https://in-toto.io/Statement/v1","subject":[{"name":"app.tgz","digest":{"sha256":"b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"}}],"predicateType":"https://slsa.dev/provenance/v1","predicate":{}}"#;
        let payload = STANDARD.encode(statement);
        let leaf = leaf_b64();
        let bundle_json = format!(
            r#"{{
                "mediaType": "application/vnd.dev.sigstore.bundle.v0.3+json",
                "verificationMaterial": {{"certificate": {{"rawBytes": "{leaf}"}}}},
                "dsseEnvelope": {{
                    "payloadType": "application/vnd.in-toto+json",
                    "payload": "{payload}",
                    "signatures": [{{"sig": "c2ln"}}]
                }}
            }}"#
        );
        let attestations = vec![Attestation {
            bundle: Bundle::from_json(&bundle_json).unwrap(),
            bundle_url: None,
        }];

        let verifier = MockSigstoreVerifier {
            certificate: crate::certificate::CertificateSummary {
                subject_alternative_name:
                    "https://github.com/acme/app/.github/workflows/ci.yml@refs/heads/main".into(),
                issuer: GITHUB_OIDC_ISSUER.into(),
                build_signer_uri: String::new(),
                runner_environment: "github-hosted".into(),
                source_repository_uri: "https://github.com/acme/app".into(),
                source_repository_owner_uri: "https://github.com/acme".into(),
            },
        };
        let policy = any_policy();
        let results = verifier.verify(&attestations, &policy).await.unwrap();
        assert_eq!(results.len(), 1);

        verify_cert_extensions(
            &results,
            &ExtensionCriteria::for_policy(&policy, None, "acme", "acme/app"),
        )
        .unwrap();
        crate::results::ensure_predicate_type(&results, "https://slsa.dev/provenance/v1").unwrap();
    }
}
