//! Small X.509 helpers shared by root selection and verifier choice

use crate::error::{Error, Result};
use der::asn1::{PrintableStringRef, Utf8StringRef};
use der::Decode;
use x509_cert::Certificate;

/// Parse a DER-encoded certificate
pub fn parse_certificate(der_bytes: &[u8]) -> Result<Certificate> {
    Certificate::from_der(der_bytes).map_err(|e| Error::Certificate(e.to_string()))
}

/// Organization (O) values of the certificate's issuer DN, in order
pub fn issuer_organizations(cert: &Certificate) -> Vec<String> {
    let mut organizations = Vec::new();
    for rdn in cert.tbs_certificate.issuer.0.iter() {
        for atv in rdn.0.iter() {
            if atv.oid == const_oid::db::rfc4519::ORGANIZATION_NAME {
                if let Some(value) = directory_string(&atv.value) {
                    organizations.push(value);
                }
            }
        }
    }
    organizations
}

/// The single issuer organization of a leaf certificate
///
/// Certificates issued by Sigstore instances carry exactly one organization;
/// anything else means the bundle cannot be routed to a trust root.
pub fn sole_issuer_organization(der_bytes: &[u8]) -> Result<String> {
    let cert = parse_certificate(der_bytes)?;
    let mut organizations = issuer_organizations(&cert);
    if organizations.len() != 1 {
        return Err(Error::AmbiguousIssuerOrganization(organizations.len()));
    }
    Ok(organizations.remove(0))
}

// DN attribute values are DirectoryString; UTF8String and PrintableString
// cover everything Fulcio and GitHub emit.
fn directory_string(value: &der::Any) -> Option<String> {
    if let Ok(s) = value.decode_as::<Utf8StringRef>() {
        return Some(s.to_string());
    }
    if let Ok(s) = value.decode_as::<PrintableStringRef>() {
        return Some(s.to_string());
    }
    None
}
