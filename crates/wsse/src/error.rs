#![forbid(unsafe_code)]

//! Faults surfaced by the WS-Security orchestrators.

use std::path::PathBuf;

/// Errors returned by [`sign`](crate::sign), [`verify`](crate::verify),
/// [`encrypt`](crate::encrypt) and [`decrypt`](crate::decrypt).
///
/// Each variant is a distinct kind callers can branch on; in particular
/// [`Error::SignatureVerificationFailed`] is what a tampered or forged
/// message produces, never a parse error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot load key material from {}: {source}", .path.display())]
    KeyMaterial {
        path: PathBuf,
        #[source]
        source: wsse_core::Error,
    },

    #[error("malformed envelope: {0}")]
    XmlParse(#[source] wsse_core::Error),

    #[error("missing element: {0}")]
    MissingElement(String),

    #[error("reference resolution failed: {0}")]
    ReferenceResolutionFailed(String),

    #[error("signature verification failed: {0}")]
    SignatureVerificationFailed(String),

    #[error("signing failed: {0}")]
    SigningFailed(#[source] wsse_core::Error),

    #[error("encryption failed: {0}")]
    EncryptionFailed(#[source] wsse_core::Error),

    #[error("decryption failed: {0}")]
    DecryptionFailed(#[source] wsse_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the envelope was rejected by signature verification.
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Error::SignatureVerificationFailed(_))
    }
}
