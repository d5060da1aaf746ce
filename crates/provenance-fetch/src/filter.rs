//! Predicate-type filtering
//!
//! Attestations whose in-toto statement does not carry the requested
//! predicate type are dropped. A bundle that is not an in-toto envelope, or
//! whose payload does not parse, is skipped rather than failing the lookup.

use crate::api::Attestation;
use crate::error::{Error, Result};
use provenance_types::Statement;

/// Keep only attestations whose statement matches `predicate_type`
///
/// Returns an error naming the predicate type when nothing survives the
/// filter, so the caller can distinguish "nothing matched" from "nothing
/// found".
pub fn filter_by_predicate_type(
    attestations: Vec<Attestation>,
    predicate_type: &str,
) -> Result<Vec<Attestation>> {
    let filtered: Vec<Attestation> = attestations
        .into_iter()
        .filter(|a| {
            let Some(envelope) = a.bundle.dsse_envelope() else {
                return false;
            };
            if !envelope.is_intoto() {
                return false;
            }
            match Statement::from_bytes(envelope.payload.as_bytes()) {
                Ok(statement) => statement.predicate_type == predicate_type,
                Err(e) => {
                    tracing::debug!("skipping attestation with undecodable statement: {e}");
                    false
                }
            }
        })
        .collect();

    if filtered.is_empty() {
        return Err(Error::NoMatchingPredicate(predicate_type.to_string()));
    }
    Ok(filtered)
}
