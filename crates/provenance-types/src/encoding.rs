//! Base64 newtypes for binary fields in wire formats
//!
//! Bundle JSON carries binary data (payloads, signatures, DER certificates)
//! as base64 strings. These newtypes keep the decoded bytes in memory while
//! serializing back to the canonical base64 form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    STANDARD.decode(s).map_err(serde::de::Error::custom)
}

macro_rules! base64_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name(
            #[serde(
                serialize_with = "serialize_base64",
                deserialize_with = "deserialize_base64"
            )]
            Vec<u8>,
        );

        impl $name {
            /// Wrap raw bytes
            pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            /// The decoded bytes
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// True when no bytes are present
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// The canonical base64 representation
            pub fn to_base64(&self) -> String {
                STANDARD.encode(&self.0)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

base64_newtype!(
    /// DSSE payload bytes
    PayloadBytes
);
base64_newtype!(
    /// Raw signature bytes (DER-encoded for ECDSA)
    SignatureBytes
);
base64_newtype!(
    /// A DER-encoded X.509 certificate
    DerCertificate
);
base64_newtype!(
    /// An RFC 3161 signed timestamp token
    SignedTimestamp
);
base64_newtype!(
    /// Raw digest bytes from a message signature
    DigestBytes
);
