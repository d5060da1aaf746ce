use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bundle(#[from] provenance_types::Error),

    #[error(transparent)]
    TrustRoot(#[from] provenance_trust_root::Error),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid policy: {0}")]
    Policy(String),

    #[error("unknown host")]
    UnknownHost,

    #[error("unsupported bundle version: {0}")]
    UnsupportedBundleVersion(String),

    #[error("bundle does not carry a signing certificate")]
    MissingCertificate,

    #[error("{0}")]
    Verification(String),

    #[error("verifying with issuer \"{issuer}\": {reason}")]
    VerifyFailed { issuer: String, reason: String },

    #[error("expected {field} to be {expected}, got {actual}")]
    ExtensionMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("expected Issuer to be {expected}, got {actual} -- if you have a custom OIDC issuer policy for your enterprise, configure the expected issuer on the verification policy")]
    IssuerMismatch { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, Error>;
