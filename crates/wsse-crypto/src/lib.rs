#![forbid(unsafe_code)]

//! Cryptographic primitives used by the signing and encryption engines.
//!
//! Every algorithm is selected by the URI that appears in the XML
//! `Algorithm` attribute, so engines never name a concrete type.

pub mod cipher;
pub mod digest;
pub mod keytransport;
pub mod sign;

pub use cipher::CipherAlgorithm;
pub use digest::DigestAlgorithm;
pub use keytransport::KeyTransportAlgorithm;
pub use sign::{SignatureAlgorithm, SigningKey};
