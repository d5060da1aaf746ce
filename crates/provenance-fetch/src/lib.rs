//! Attestation retrieval
//!
//! Reads attestation bundles from the three supported sources: a local
//! `.json`/`.jsonl` file, bundles attached to the artifact in its OCI
//! registry, and the paginated attestations REST API. Results can be
//! narrowed by in-toto predicate type and persisted back to disk as JSON
//! lines for offline verification.
//!
//! ```no_run
//! use provenance_fetch::{fetch_attestations, filter_by_predicate_type, FetchConfig, LiveClient};
//! use provenance_artifact::{resolve, HttpRegistryClient};
//! use provenance_types::HashAlgorithm;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = HttpRegistryClient::new(None);
//! let artifact = resolve(&registry, "my-artifact.tgz", HashAlgorithm::Sha256).await?;
//!
//! let api = LiveClient::new("github.com", None);
//! let config = FetchConfig {
//!     repo: Some("acme/app".to_string()),
//!     limit: 30,
//!     ..Default::default()
//! };
//! let attestations = fetch_attestations(&config, &api, &registry, &artifact).await?;
//! let provenance = filter_by_predicate_type(attestations, "https://slsa.dev/provenance/v1")?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod download;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod local;

pub use api::{
    ApiTransport, Attestation, AttestationsClient, AttestationsPage, HttpApiTransport, LiveClient,
    DEFAULT_LIMIT,
};
pub use download::write_bundles_to_jsonl;
pub use error::{Error, Result};
pub use fetch::{fetch_attestations, FetchConfig};
pub use filter::filter_by_predicate_type;
pub use local::load_bundles_from_file;
