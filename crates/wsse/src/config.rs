#![forbid(unsafe_code)]

//! Algorithm and coverage options for signing and encryption.

use wsse_core::algorithm;

/// A part of the envelope covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedPart {
    /// `soap:Body`.
    Body,
    /// `Security/wsu:Timestamp`.
    Timestamp,
    /// A direct child of `soap:Header`.
    Header { namespace: String, local_name: String },
}

#[derive(Debug, Clone)]
pub struct SigningConfig {
    pub signature_method: String,
    pub digest_method: String,
    pub c14n_method: String,
    pub parts: Vec<SignedPart>,
    /// Also embed the certificate as `X509Certificate` next to the
    /// issuer/serial pair.
    pub embed_certificate: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            signature_method: algorithm::RSA_SHA1.to_owned(),
            digest_method: algorithm::SHA1.to_owned(),
            c14n_method: algorithm::EXC_C14N.to_owned(),
            parts: vec![SignedPart::Body, SignedPart::Timestamp],
            embed_certificate: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncryptionConfig {
    /// Block cipher for the `EncryptedData`.
    pub data_method: String,
    /// Key transport for the `EncryptedKey`.
    pub key_transport: String,
    /// OAEP digest written as `ds:DigestMethod`; SHA-1 when unset.
    pub oaep_digest: Option<String>,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            data_method: algorithm::TRIPLEDES_CBC.to_owned(),
            key_transport: algorithm::RSA_OAEP.to_owned(),
            oaep_digest: None,
        }
    }
}
