//! Error types for artifact resolution

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving an artifact to a digest
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Local file could not be read
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    /// The string could not be parsed as a registry reference
    #[error("invalid registry reference: {0}")]
    InvalidReference(String),

    /// Registry returned 401; the caller should authenticate first
    #[error("remote registry authorization failed, please authenticate with the registry and try again")]
    RegistryAuthz,

    /// Registry returned 403; the token lacks access to the resource
    #[error("the provided token was denied access to the requested resource, please check the token's expiration and repository access")]
    AccessDenied,

    /// Any other registry transport failure
    #[error("registry request failed: {0}")]
    Registry(String),
}

impl Error {
    /// True when the error indicates a registry permission problem
    /// (either missing authentication or an under-scoped token).
    pub fn is_registry_access(&self) -> bool {
        matches!(self, Error::RegistryAuthz | Error::AccessDenied)
    }
}
