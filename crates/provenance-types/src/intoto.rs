//! In-toto statement types
//!
//! The statement is the claim body inside a DSSE envelope: subjects identified
//! by digest, a predicate type tag, and an arbitrary predicate.

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An in-toto statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Statement type URI (e.g. `https://in-toto.io/Statement/v1`)
    #[serde(rename = "_type", default)]
    pub statement_type: String,
    /// Artifacts the claim is about
    #[serde(default)]
    pub subject: Vec<Subject>,
    /// Type tag of the predicate
    #[serde(rename = "predicateType", default)]
    pub predicate_type: String,
    /// The claim body
    #[serde(default)]
    pub predicate: serde_json::Value,
}

/// A subject of an in-toto statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject name (artifact path or image name)
    #[serde(default)]
    pub name: String,
    /// Digests keyed by algorithm name
    #[serde(default)]
    pub digest: BTreeMap<String, String>,
}

impl Statement {
    /// Parse a statement from JSON
    pub fn from_json(json: &str) -> Result<Statement> {
        serde_json::from_str(json).map_err(Error::Json)
    }

    /// Parse a statement from raw payload bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Statement> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::InvalidEncoding(format!("statement is not UTF-8: {e}")))?;
        Self::from_json(text)
    }

    /// True when any subject carries the given digest for the given algorithm
    ///
    /// Comparison is case-insensitive over the hex digest.
    pub fn matches_digest(&self, algorithm: HashAlgorithm, hex_digest: &str) -> bool {
        self.subject.iter().any(|subject| {
            subject
                .digest
                .get(algorithm.as_str())
                .is_some_and(|d| d.eq_ignore_ascii_case(hex_digest))
        })
    }
}
