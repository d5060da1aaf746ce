use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode bundle JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bundle(#[from] provenance_types::Error),

    #[error(transparent)]
    Registry(#[from] provenance_artifact::Error),

    #[error("bundle file extension not supported, must be json or jsonl: {}", .0.display())]
    UnrecognizedBundleExtension(PathBuf),

    #[error("limit {0} not allowed, must be between 1 and 1000")]
    InvalidLimit(usize),

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Api { url: String, status: u16 },

    #[error("no attestations found for {subject}")]
    NoAttestations { subject: String },

    #[error("no attestations found with predicate type: {0}")]
    NoMatchingPredicate(String),

    #[error(
        "no attestations found in the OCI registry; \
         retry without the registry bundle option to check the attestations API"
    )]
    RegistryEmpty,

    #[error("owner or repo must be provided")]
    MissingSubjectScope,

    #[error("artifact reference is not an OCI image, cannot fetch bundles from the registry")]
    NotAnOciReference,
}

impl Error {
    /// True when the API answered but held no attestations for the digest,
    /// as opposed to a transport or decoding failure.
    pub fn is_no_attestations(&self) -> bool {
        matches!(self, Error::NoAttestations { .. })
    }
}
