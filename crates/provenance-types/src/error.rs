//! Error types for the data model

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or interpreting attestation data
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// JSON serialization or deserialization failure
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Unknown bundle media type
    #[error("invalid bundle media type: {0}")]
    InvalidMediaType(String),

    /// Digest algorithm outside the supported set
    #[error("unsupported digest algorithm: {0} (expected sha256 or sha512)")]
    UnsupportedAlgorithm(String),

    /// Base64 or hex decoding failure
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A structurally required field is absent
    #[error("missing field: {0}")]
    MissingField(String),
}

impl Error {
    /// True when the error is the unsupported-digest-algorithm sentinel.
    pub fn is_unsupported_algorithm(&self) -> bool {
        matches!(self, Error::UnsupportedAlgorithm(_))
    }
}
