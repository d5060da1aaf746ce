//! Local bundle files
//!
//! A `.json` file holds a single bundle; a `.jsonl` file holds one bundle per
//! line and is read without loading the whole file into memory.

use crate::api::Attestation;
use crate::error::{Error, Result};
use provenance_types::Bundle;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read attestations from a local bundle file, dispatching on extension
pub fn load_bundles_from_file(path: &Path) -> Result<Vec<Attestation>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_bundle_from_json_file(path),
        Some("jsonl") => load_bundles_from_json_lines_file(path),
        _ => Err(Error::UnrecognizedBundleExtension(path.to_path_buf())),
    }
}

fn load_bundle_from_json_file(path: &Path) -> Result<Vec<Attestation>> {
    let json = std::fs::read_to_string(path)?;
    let bundle = Bundle::from_json(&json)?;
    Ok(vec![Attestation {
        bundle,
        bundle_url: None,
    }])
}

fn load_bundles_from_json_lines_file(path: &Path) -> Result<Vec<Attestation>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut attestations = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let bundle = Bundle::from_json(&line)?;
        attestations.push(Attestation {
            bundle,
            bundle_url: None,
        });
    }
    Ok(attestations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::sample_attestation;
    use std::io::Write;

    fn bundle_json() -> String {
        sample_attestation("https://slsa.dev/provenance/v1")
            .bundle
            .to_json()
            .unwrap()
    }

    #[test]
    fn test_load_single_json_bundle() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", bundle_json()).unwrap();

        let attestations = load_bundles_from_file(file.path()).unwrap();
        assert_eq!(attestations.len(), 1);
        assert!(attestations[0].bundle_url.is_none());
    }

    #[test]
    fn test_load_json_lines_bundles() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        let json = bundle_json();
        writeln!(file, "{json}").unwrap();
        writeln!(file, "{json}").unwrap();
        writeln!(file, "{json}").unwrap();

        let attestations = load_bundles_from_file(file.path()).unwrap();
        assert_eq!(attestations.len(), 3);
    }

    #[test]
    fn test_malformed_json_line_fails() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{}", bundle_json()).unwrap();
        writeln!(file, "not a bundle").unwrap();

        assert!(load_bundles_from_file(file.path()).is_err());
    }

    #[test]
    fn test_unrecognized_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = load_bundles_from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedBundleExtension(_)));
    }
}
