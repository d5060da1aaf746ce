//! Trust root selection
//!
//! Routes a bundle's issuer organization to the trusted root that should
//! verify it: a document from a caller-supplied root file when one is given,
//! otherwise the built-in public good or GitHub root fetched over TUF.

use crate::error::{Error, Result};
use crate::trusted_root::TrustedRoot;
use crate::tuf::{TufClient, TRUSTED_ROOT_TARGET};

/// Issuer organization of the Sigstore public good instance
pub const PUBLIC_GOOD_ISSUER_ORG: &str = "sigstore.dev";

/// Issuer organization of GitHub's Sigstore instance
pub const GITHUB_ISSUER_ORG: &str = "GitHub, Inc.";

/// TUF target name for a trusted root, qualified by tenant trust domain
/// when one applies
pub fn trusted_root_target(trust_domain: &str) -> String {
    if trust_domain.is_empty() {
        TRUSTED_ROOT_TARGET.to_string()
    } else {
        format!("{trust_domain}.{TRUSTED_ROOT_TARGET}")
    }
}

/// Fetch a trusted root over TUF
///
/// `trust_domain` is empty outside tenant hosts; tenants get the
/// trust-domain-qualified target from the same repository.
pub async fn fetch_trusted_root(tuf: &dyn TufClient, trust_domain: &str) -> Result<TrustedRoot> {
    let target = trusted_root_target(trust_domain);
    let bytes = tuf.get_target(&target).await?;
    let json = String::from_utf8(bytes)
        .map_err(|e| Error::Tuf(format!("invalid UTF-8 in {target}: {e}")))?;
    TrustedRoot::from_json(&json)
}

/// Pick the custom trusted root document matching the bundle's issuer
///
/// Roots are consulted in file order; the first whose lowest chain
/// certificate was issued by `issuer` wins. Matching the public good issuer
/// while the public good instance is disallowed is a policy error, not a
/// miss.
pub fn select_custom_root<'a>(
    roots: &'a [TrustedRoot],
    issuer: &str,
    no_public_good: bool,
) -> Result<&'a TrustedRoot> {
    for root in roots {
        if root.matches_issuer_organization(issuer) {
            if issuer == PUBLIC_GOOD_ISSUER_ORG && no_public_good {
                return Err(Error::PublicGoodDisallowed);
            }
            return Ok(root);
        }
    }
    Err(Error::NoMatchingRoot)
}
