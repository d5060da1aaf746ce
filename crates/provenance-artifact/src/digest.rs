//! Streaming file digesting

use crate::error::Result;
use provenance_types::HashAlgorithm;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Digest a local file, streaming its contents
///
/// Files are read in chunks rather than buffered wholesale, so arbitrarily
/// large artifacts can be digested in constant memory.
pub fn digest_file(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<String> {
    let file = File::open(path)?;
    digest_reader(file, algorithm)
}

/// Digest an arbitrary reader, returning the lowercase hex digest
pub fn digest_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> Result<String> {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            copy_into(&mut reader, &mut hasher)?;
            Ok(hex::encode(hasher.finalize()))
        }
        HashAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            copy_into(&mut reader, &mut hasher)?;
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

fn copy_into<R: Read, D: Digest>(reader: &mut R, hasher: &mut D) -> Result<()> {
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(())
}
