#![forbid(unsafe_code)]

//! XML Digital Signature over in-memory documents.
//!
//! [`sign`] fills the `DigestValue` and `SignatureValue` of a `Signature`
//! element already placed in the document; [`verify`] recomputes both and
//! checks them against the key the `KeyInfo` points at.

pub mod context;
pub mod keyinfo;
pub mod sign;
pub mod signed_info;
pub mod transform;
pub mod verify;

pub use context::DsigContext;
pub use sign::sign;
pub use verify::{verify, VerifyResult};

use base64::Engine;
use wsse_core::Error;

/// Decode element text as base64, ignoring embedded whitespace.
pub fn decode_base64(text: &str, what: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(format!("{what}: {e}")))
}

pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}
