//! Cryptographic verification of a single attestation bundle.
//!
//! A [`SignedEntityVerifier`] checks one bundle against a policy: the
//! signing certificate must chain to the trusted root and be valid at
//! signing time, the DSSE signature must verify under the leaf key,
//! and the embedded statement must cover the artifact digest.

use const_oid::db::rfc5280::{ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE};
use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ID_EC_PUBLIC_KEY, ID_KP_CODE_SIGNING, SECP_256_R_1,
    SECP_384_R_1,
};
use const_oid::ObjectIdentifier;
use der::{Decode, Encode, Header, Reader, SliceReader};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::signature::Verifier;
use provenance_trust_root::TrustedRoot;
use provenance_types::{Bundle, Statement};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha384};
use x509_cert::ext::pkix::{ExtendedKeyUsage, KeyUsage, KeyUsages};
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::Certificate;

use crate::certificate::{summarize_certificate, CertificateSummary};
use crate::error::{Error, Result};
use crate::policy::{SanMatcher, VerifyPolicy};

/// What a successful verification proved about one bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// The in-toto statement carried by the bundle.
    pub statement: Statement,
    /// Claims extracted from the signing certificate.
    pub certificate: CertificateSummary,
}

/// Verifies one bundle against a policy.
pub trait SignedEntityVerifier: Send + Sync {
    fn verify(&self, bundle: &Bundle, policy: &VerifyPolicy) -> Result<VerificationResult>;
}

/// Verifier backed by a concrete trusted root.
#[derive(Debug, Clone)]
pub struct LiveVerifier {
    trusted_root: TrustedRoot,
}

impl LiveVerifier {
    pub fn new(trusted_root: TrustedRoot) -> Self {
        Self { trusted_root }
    }
}

impl SignedEntityVerifier for LiveVerifier {
    fn verify(&self, bundle: &Bundle, policy: &VerifyPolicy) -> Result<VerificationResult> {
        let leaf_der = bundle
            .signing_certificate()
            .ok_or(Error::MissingCertificate)?
            .as_bytes()
            .to_vec();
        let envelope = bundle
            .dsse_envelope()
            .ok_or_else(|| Error::Verification("bundle does not contain a DSSE envelope".into()))?;
        if envelope.signatures.is_empty() {
            return Err(Error::Verification("no signatures in DSSE envelope".into()));
        }

        // Signing certificates are short-lived, so validate them at the
        // time the transparency log saw the signature rather than now.
        let validation_time = bundle
            .integrated_time_secs()
            .unwrap_or_else(|| chrono::Utc::now().timestamp());

        verify_certificate_chain(&leaf_der, validation_time, &self.trusted_root)?;
        verify_leaf_profile(&leaf_der)?;

        let leaf = Certificate::from_der(&leaf_der)
            .map_err(|e| Error::Verification(format!("failed to parse signing certificate: {e}")))?;
        let pae = envelope.pae();
        let spki = &leaf.tbs_certificate.subject_public_key_info;
        let curve_oid = extract_ec_curve_oid(spki)?;
        let mut any_verified = false;
        for signature in &envelope.signatures {
            if verify_ecdsa(spki, curve_oid, dsse_hash_for_curve(curve_oid)?, &pae, signature.sig.as_bytes())
                .is_ok()
            {
                any_verified = true;
                break;
            }
        }
        if !any_verified {
            return Err(Error::Verification(
                "envelope signature does not verify under the signing certificate".into(),
            ));
        }

        if !envelope.is_intoto() {
            return Err(Error::Verification(format!(
                "unexpected envelope payload type: {}",
                envelope.payload_type
            )));
        }
        let statement = Statement::from_bytes(envelope.payload.as_bytes())?;
        if !statement.matches_digest(policy.digest_algorithm, &policy.hex_digest) {
            return Err(Error::Verification(
                "attestation subject does not match the artifact digest".into(),
            ));
        }

        let certificate = summarize_certificate(&leaf_der)?;
        match &policy.san {
            SanMatcher::Any => {}
            SanMatcher::Exact(want) => {
                if *want != certificate.subject_alternative_name {
                    return Err(Error::Verification(format!(
                        "expected certificate identity to be {want}, got {}",
                        certificate.subject_alternative_name
                    )));
                }
            }
            SanMatcher::Regex(re) => {
                if !re.is_match(&certificate.subject_alternative_name) {
                    return Err(Error::Verification(format!(
                        "expected certificate identity to match {re}, got {}",
                        certificate.subject_alternative_name
                    )));
                }
            }
        }
        if let Some(expected) = &policy.runner_environment {
            if certificate.runner_environment != *expected {
                return Err(Error::ExtensionMismatch {
                    field: "RunnerEnvironment",
                    expected: expected.clone(),
                    actual: certificate.runner_environment.clone(),
                });
            }
        }

        Ok(VerificationResult {
            statement,
            certificate,
        })
    }
}

/// Checks that `cert_der` was signed by a certificate in the trusted
/// root and is within its validity period at `validation_time`.
pub fn verify_certificate_chain(
    cert_der: &[u8],
    validation_time: i64,
    trusted_root: &TrustedRoot,
) -> Result<()> {
    let leaf = Certificate::from_der(cert_der)
        .map_err(|e| Error::Verification(format!("failed to parse signing certificate: {e}")))?;
    let leaf_issuer = &leaf.tbs_certificate.issuer;
    let sig_alg_oid = leaf.signature_algorithm.oid;
    let signature = leaf
        .signature
        .as_bytes()
        .ok_or_else(|| Error::Verification("certificate signature is not byte-aligned".into()))?;

    // Verify the original TBS bytes. Re-serializing the parsed form can
    // produce different DER and break the signature.
    let tbs_der = extract_tbs_der(cert_der)?;

    let mut candidates = 0usize;
    let mut chained = false;
    for authority in &trusted_root.certificate_authorities {
        for ca_cert in &authority.cert_chain.certificates {
            candidates += 1;
            let Ok(issuer) = Certificate::from_der(ca_cert.raw_bytes.as_bytes()) else {
                continue;
            };
            if issuer.tbs_certificate.subject != *leaf_issuer {
                continue;
            }
            let issuer_spki = &issuer.tbs_certificate.subject_public_key_info;
            let Ok(curve_oid) = extract_ec_curve_oid(issuer_spki) else {
                continue;
            };
            let Ok(hash) = hash_for_signature_algorithm(sig_alg_oid) else {
                continue;
            };
            if verify_ecdsa(issuer_spki, curve_oid, hash, &tbs_der, signature).is_ok() {
                chained = true;
                break;
            }
        }
        if chained {
            break;
        }
    }
    if candidates == 0 {
        return Err(Error::Verification(
            "trusted root contains no certificate authorities".into(),
        ));
    }
    if !chained {
        return Err(Error::Verification(
            "certificate does not chain to a trusted certificate authority".into(),
        ));
    }

    let not_before = leaf
        .tbs_certificate
        .validity
        .not_before
        .to_unix_duration()
        .as_secs() as i64;
    let not_after = leaf
        .tbs_certificate
        .validity
        .not_after
        .to_unix_duration()
        .as_secs() as i64;
    if validation_time < not_before {
        return Err(Error::Verification(format!(
            "certificate not yet valid: validation time {validation_time} is before {not_before}"
        )));
    }
    if validation_time > not_after {
        return Err(Error::Verification(format!(
            "certificate has expired: validation time {validation_time} is after {not_after}"
        )));
    }
    Ok(())
}

/// Signing certificates must carry digitalSignature key usage and the
/// codeSigning extended key usage.
pub fn verify_leaf_profile(cert_der: &[u8]) -> Result<()> {
    let cert = Certificate::from_der(cert_der)
        .map_err(|e| Error::Verification(format!("failed to parse signing certificate: {e}")))?;
    let extensions = cert
        .tbs_certificate
        .extensions
        .as_ref()
        .ok_or_else(|| Error::Verification("certificate has no extensions".into()))?;

    let key_usage_ext = extensions
        .iter()
        .find(|ext| ext.extn_id == ID_CE_KEY_USAGE)
        .ok_or_else(|| Error::Verification("certificate is missing the KeyUsage extension".into()))?;
    let key_usage = KeyUsage::from_der(key_usage_ext.extn_value.as_bytes())
        .map_err(|e| Error::Verification(format!("failed to parse KeyUsage extension: {e}")))?;
    if !key_usage.0.contains(KeyUsages::DigitalSignature) {
        return Err(Error::Verification(
            "KeyUsage extension does not contain digitalSignature".into(),
        ));
    }

    let eku_ext = extensions
        .iter()
        .find(|ext| ext.extn_id == ID_CE_EXT_KEY_USAGE)
        .ok_or_else(|| {
            Error::Verification("certificate is missing the ExtendedKeyUsage extension".into())
        })?;
    let eku = ExtendedKeyUsage::from_der(eku_ext.extn_value.as_bytes())
        .map_err(|e| Error::Verification(format!("failed to parse ExtendedKeyUsage extension: {e}")))?;
    if !eku.0.contains(&ID_KP_CODE_SIGNING) {
        return Err(Error::Verification(
            "ExtendedKeyUsage extension does not contain codeSigning".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashKind {
    Sha256,
    Sha384,
}

fn hash_for_signature_algorithm(sig_alg_oid: ObjectIdentifier) -> Result<HashKind> {
    if sig_alg_oid == ECDSA_WITH_SHA_256 {
        Ok(HashKind::Sha256)
    } else if sig_alg_oid == ECDSA_WITH_SHA_384 {
        Ok(HashKind::Sha384)
    } else {
        Err(Error::Verification(format!(
            "unsupported signature algorithm: {sig_alg_oid}"
        )))
    }
}

/// DSSE signatures follow the key's curve: P-256 keys sign SHA-256
/// digests, P-384 keys sign SHA-384 digests.
fn dsse_hash_for_curve(curve_oid: ObjectIdentifier) -> Result<HashKind> {
    if curve_oid == SECP_256_R_1 {
        Ok(HashKind::Sha256)
    } else if curve_oid == SECP_384_R_1 {
        Ok(HashKind::Sha384)
    } else {
        Err(Error::Verification(format!(
            "unsupported key curve: {curve_oid}"
        )))
    }
}

fn extract_ec_curve_oid(spki: &SubjectPublicKeyInfoOwned) -> Result<ObjectIdentifier> {
    if spki.algorithm.oid != ID_EC_PUBLIC_KEY {
        return Err(Error::Verification("not an EC public key".into()));
    }
    let params = spki
        .algorithm
        .parameters
        .as_ref()
        .ok_or_else(|| Error::Verification("EC public key missing curve parameters".into()))?;
    ObjectIdentifier::from_bytes(params.value())
        .map_err(|e| Error::Verification(format!("failed to parse EC curve OID: {e}")))
}

/// Verifies an ECDSA signature in ASN.1 DER form over `message`.
fn verify_ecdsa(
    spki: &SubjectPublicKeyInfoOwned,
    curve_oid: ObjectIdentifier,
    hash: HashKind,
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    let key_bytes = spki
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| Error::Verification("public key is not byte-aligned".into()))?;

    if curve_oid == SECP_256_R_1 {
        let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(key_bytes)
            .map_err(|e| Error::Verification(format!("invalid P-256 public key: {e}")))?;
        let sig = p256::ecdsa::Signature::from_der(signature)
            .map_err(|e| Error::Verification(format!("invalid ECDSA signature: {e}")))?;
        match hash {
            HashKind::Sha256 => key
                .verify(message, &sig)
                .map_err(|_| Error::Verification("signature verification failed".into())),
            HashKind::Sha384 => {
                let digest = Sha384::digest(message);
                key.verify_prehash(&digest, &sig)
                    .map_err(|_| Error::Verification("signature verification failed".into()))
            }
        }
    } else if curve_oid == SECP_384_R_1 {
        if hash != HashKind::Sha384 {
            return Err(Error::Verification(
                "unsupported curve and hash combination".into(),
            ));
        }
        let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(key_bytes)
            .map_err(|e| Error::Verification(format!("invalid P-384 public key: {e}")))?;
        let sig = p384::ecdsa::Signature::from_der(signature)
            .map_err(|e| Error::Verification(format!("invalid ECDSA signature: {e}")))?;
        key.verify(message, &sig)
            .map_err(|_| Error::Verification("signature verification failed".into()))
    } else {
        Err(Error::Verification(format!(
            "unsupported key curve: {curve_oid}"
        )))
    }
}

/// The raw DER bytes of the tbsCertificate element, header included.
fn extract_tbs_der(cert_der: &[u8]) -> Result<Vec<u8>> {
    let decode_err = |e: der::Error| Error::Verification(format!("malformed certificate DER: {e}"));

    let mut reader = SliceReader::new(cert_der).map_err(decode_err)?;
    let outer = Header::decode(&mut reader).map_err(decode_err)?;
    let contents = reader.read_slice(outer.length).map_err(decode_err)?;

    let mut tbs_reader = SliceReader::new(contents).map_err(decode_err)?;
    let tbs_header = Header::decode(&mut tbs_reader).map_err(decode_err)?;
    let header_len: usize = tbs_header
        .encoded_len()
        .map_err(decode_err)?
        .try_into()
        .map_err(|_| Error::Verification("TBS header length too large".into()))?;
    let body_len: usize = tbs_header
        .length
        .try_into()
        .map_err(|_| Error::Verification("TBS body length too large".into()))?;
    let total = header_len
        .checked_add(body_len)
        .filter(|len| *len <= contents.len())
        .ok_or_else(|| Error::Verification("TBS length exceeds certificate contents".into()))?;
    Ok(contents[..total].to_vec())
}
