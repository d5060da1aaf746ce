//! Trusted root retrieval and selection
//!
//! A trusted root names the certificate authorities and transparency logs a
//! verifier accepts. Roots come from three places: the Sigstore public good
//! TUF repository, GitHub's TUF repository (optionally qualified by a tenant
//! trust domain), or a caller-supplied file of newline-delimited root
//! documents for offline verification.
//!
//! ```no_run
//! use provenance_trust_root::{fetch_trusted_root, ToughTufClient, TufClient, TufOptions};
//!
//! # async fn example() -> Result<(), provenance_trust_root::Error> {
//! let tuf = ToughTufClient::new(TufOptions::github());
//! let root = fetch_trusted_root(&tuf, "").await?;
//! println!("loaded {} certificate authorities", root.certificate_authorities.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod provider;
pub mod trusted_root;
pub mod tuf;
pub mod x509;

pub use error::{Error, Result};
pub use provider::{
    fetch_trusted_root, select_custom_root, trusted_root_target, GITHUB_ISSUER_ORG,
    PUBLIC_GOOD_ISSUER_ORG,
};
pub use trusted_root::{
    CertificateAuthority, CertificateChain, TimeRange, TransparencyLog, TrustedRoot,
};
pub use tuf::{
    ToughTufClient, TufClient, TufOptions, GITHUB_TUF_ROOT, GITHUB_TUF_URL, PUBLIC_GOOD_TUF_ROOT,
    PUBLIC_GOOD_TUF_URL, TRUSTED_ROOT_TARGET,
};
pub use x509::{issuer_organizations, parse_certificate, sole_issuer_organization};
