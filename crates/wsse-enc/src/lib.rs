#![forbid(unsafe_code)]

//! XML Encryption over in-memory documents.
//!
//! [`encrypt`] replaces a target element (or its content) with a filled-in
//! `EncryptedData` template, wrapping the session key into any
//! `EncryptedKey` the template carries. [`decrypt`] reverses it in place.

pub mod context;
pub mod decrypt;
pub mod encrypt;

pub use context::EncContext;
pub use decrypt::{decrypt, decrypt_key};
pub use encrypt::{encrypt, encrypt_key};

use base64::Engine;
use wsse_core::{ns, Error};
use wsse_xml::{Document, NodeId};

/// The `Algorithm` of the `EncryptionMethod` child of `node`.
pub(crate) fn encryption_method(doc: &Document, node: NodeId) -> Result<String, Error> {
    let method = doc
        .find_child(node, ns::ENC, ns::node::ENCRYPTION_METHOD)
        .ok_or_else(|| Error::MissingElement("EncryptionMethod".into()))?;
    doc.attribute(method, ns::attr::ALGORITHM)
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on EncryptionMethod".into()))
}

/// The `DigestMethod` nested in `EncryptionMethod`, for RSA-OAEP.
pub(crate) fn oaep_digest(doc: &Document, node: NodeId) -> Option<String> {
    let method = doc.find_child(node, ns::ENC, ns::node::ENCRYPTION_METHOD)?;
    let digest = doc.find_child(method, ns::DSIG, ns::node::DIGEST_METHOD)?;
    doc.attribute(digest, ns::attr::ALGORITHM).map(str::to_owned)
}

/// The `CipherData/CipherValue` element of `node`.
pub(crate) fn cipher_value(doc: &Document, node: NodeId) -> Result<NodeId, Error> {
    doc.find_child(node, ns::ENC, ns::node::CIPHER_DATA)
        .and_then(|cd| doc.find_child(cd, ns::ENC, ns::node::CIPHER_VALUE))
        .ok_or_else(|| Error::MissingElement("CipherData/CipherValue".into()))
}

pub(crate) fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

pub(crate) fn decode_base64(text: &str, what: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(format!("{what}: {e}")))
}
