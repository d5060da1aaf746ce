//! Verification of artifact attestations against Sigstore trust roots.
//!
//! The flow: build a [`VerifyPolicy`] for the artifact, hand the
//! fetched attestations to a [`SigstoreVerifier`], then enforce the
//! certificate extension claims with [`verify_cert_extensions`].
//!
//! ```no_run
//! use provenance_artifact::{resolve, HttpRegistryClient};
//! use provenance_types::HashAlgorithm;
//! use provenance_verify::{
//!     verify_cert_extensions, ExtensionCriteria, LiveSigstoreVerifier, PolicyBuilder,
//!     SigstoreConfig, SigstoreVerifier,
//! };
//!
//! # async fn run(attestations: Vec<provenance_fetch::Attestation>) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = HttpRegistryClient::new(None);
//! let artifact = resolve(&registry, "app.tgz", HashAlgorithm::Sha256).await?;
//! let policy = PolicyBuilder::new(&artifact)?
//!     .signer_repo(None, "acme/app")
//!     .build()?;
//!
//! let verifier = LiveSigstoreVerifier::new(SigstoreConfig::default());
//! let results = verifier.verify(&attestations, &policy).await?;
//!
//! let criteria = ExtensionCriteria::for_policy(&policy, None, "", "acme/app");
//! verify_cert_extensions(&results, &criteria)?;
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod error;
pub mod extensions;
pub mod policy;
pub mod results;
pub mod sigstore;
pub mod verifier;

pub use certificate::{summarize_certificate, CertificateSummary};
pub use error::{Error, Result};
pub use extensions::{verify_cert_extensions, ExtensionCriteria};
pub use policy::{
    expand_to_github_url, validate_signer_workflow, PolicyBuilder, SanMatcher, VerifyPolicy,
    GITHUB_HOSTED_RUNNER, GITHUB_OIDC_ISSUER, SLSA_PREDICATE_V1,
};
pub use results::{ensure_predicate_type, to_json_lines, AttestationProcessingResult};
pub use sigstore::{LiveSigstoreVerifier, SigstoreConfig, SigstoreVerifier};
pub use verifier::{
    verify_certificate_chain, verify_leaf_profile, LiveVerifier, SignedEntityVerifier,
    VerificationResult,
};
