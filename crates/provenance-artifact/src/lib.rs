//! Artifact resolution for attestation verification
//!
//! Turns a user-supplied reference (a local file path, a `file://` URI, or an
//! `oci://` image reference) into a [`DigestedArtifact`]: the canonical
//! subject identity every downstream stage joins against.
//!
//! # Example
//!
//! ```no_run
//! use provenance_artifact::{resolve, HttpRegistryClient};
//! use provenance_types::HashAlgorithm;
//!
//! # async fn example() -> Result<(), provenance_artifact::Error> {
//! let registry = HttpRegistryClient::new(None);
//! let artifact = resolve(&registry, "dist/app.tgz", HashAlgorithm::Sha256).await?;
//! println!("subject: {}", artifact.digest_with_alg());
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod digest;
pub mod error;
pub mod oci;

pub use artifact::{resolve, DigestedArtifact};
pub use digest::{digest_file, digest_reader};
pub use error::{Error, Result};
pub use oci::{HttpRegistryClient, RegistryClient};
pub use oci_distribution::Reference;
