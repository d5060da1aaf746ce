pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode trusted root JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TUF error: {0}")]
    Tuf(String),

    #[error("failed to parse certificate: {0}")]
    Certificate(String),

    #[error("certificate authority has no certificates")]
    EmptyCertificateChain,

    #[error("expected the certificate issuer to have one organization, got {0}")]
    AmbiguousIssuerOrganization(usize),

    #[error("unable to use provided trusted roots")]
    NoMatchingRoot,

    #[error("detected public good instance but verification against the public good instance was disallowed")]
    PublicGoodDisallowed,
}

impl Error {
    /// True when a custom root matched the public good issuer while the
    /// public good instance was explicitly excluded.
    pub fn is_public_good_disallowed(&self) -> bool {
        matches!(self, Error::PublicGoodDisallowed)
    }
}
