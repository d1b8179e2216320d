#![forbid(unsafe_code)]

/// Failures of the XML, crypto, key and engine crates.
///
/// The WS-Security layer maps these onto its own fault kinds; nothing
/// below it decides whether a problem is a verification failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input is not well-formed XML.
    #[error("malformed XML: {0}")]
    XmlParse(String),

    /// A tree operation would produce an invalid tree, e.g. a cycle.
    #[error("bad document structure: {0}")]
    XmlStructure(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("bad key: {0}")]
    Key(String),

    #[error("bad certificate: {0}")]
    Certificate(String),

    #[error("invalid base64 in {0}")]
    Base64(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no suitable key: {0}")]
    KeyNotFound(String),

    #[error("element not found: {0}")]
    MissingElement(String),

    #[error("attribute not found: {0}")]
    MissingAttribute(String),

    /// A same-document reference that is malformed or names no element.
    #[error("unresolvable reference: {0}")]
    InvalidUri(String),
}

pub type Result<T> = std::result::Result<T, Error>;
