//! Writing fetched bundles to disk for offline verification
//!
//! Bundles are stored one JSON document per line in a file named after the
//! artifact digest, e.g. `sha256:1234.jsonl`, so the file can be fed back in
//! as a local bundle path later.

use crate::api::Attestation;
use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write bundles as JSON lines to `{digest_with_alg}.jsonl` under `dir`,
/// replacing any previous content. Returns the path written.
pub fn write_bundles_to_jsonl(
    attestations: &[Attestation],
    digest_with_alg: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let path = dir.join(format!("{digest_with_alg}.jsonl"));
    let mut file = File::create(&path)?;
    for attestation in attestations {
        let json = attestation.bundle.to_json()?;
        writeln!(file, "{json}")?;
    }
    Ok(path)
}
