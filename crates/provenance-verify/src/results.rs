//! Aggregated verification output.

use provenance_fetch::Attestation;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::verifier::VerificationResult;

/// One attestation paired with what its verification proved. A batch
/// of these is produced only when every attestation verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationProcessingResult {
    pub attestation: Attestation,
    pub verification_result: VerificationResult,
}

/// Requires every verified statement to carry `predicate_type`.
pub fn ensure_predicate_type(
    results: &[AttestationProcessingResult],
    predicate_type: &str,
) -> Result<()> {
    for result in results {
        let got = &result.verification_result.statement.predicate_type;
        if got != predicate_type {
            return Err(Error::Verification(format!(
                "attestation predicate type {got} does not match expected predicate type {predicate_type}"
            )));
        }
    }
    Ok(())
}

/// Serializes results one JSON document per line, in input order.
pub fn to_json_lines(results: &[AttestationProcessingResult]) -> Result<String> {
    let mut out = String::new();
    for result in results {
        out.push_str(&serde_json::to_string(result)?);
        out.push('\n');
    }
    Ok(out)
}
