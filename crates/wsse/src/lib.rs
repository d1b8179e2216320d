#![forbid(unsafe_code)]

//! WS-Security X.509 token profile for SOAP 1.1 envelopes.
//!
//! [`sign`] and [`verify`] handle an RSA-SHA1 signature over `Body` and
//! `Timestamp` whose key is named by issuer and serial number.
//! [`encrypt`] and [`decrypt`] handle 3DES-CBC encryption of the first
//! `Body` element with an RSA-OAEP session key addressed to a
//! `BinarySecurityToken`. [`WssePlugin`] chains them for a client.
//!
//! Every function takes serialized envelope bytes and returns new bytes;
//! nothing is written unless the whole operation succeeds.

pub mod config;
pub mod decryption;
pub mod encryption;
pub mod envelope;
pub mod error;
pub mod id;
pub mod material;
pub mod plugin;
pub mod signing;
pub mod token;

pub use config::{EncryptionConfig, SignedPart, SigningConfig};
pub use decryption::decrypt;
pub use encryption::{encrypt, encrypt_with};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use id::ensure_id;
pub use plugin::{MessageContext, MessagePlugin, WssePlugin};
pub use signing::{sign, sign_with, verify};
pub use wsse_xml::qualify;

pub use wsse_c14n as c14n;
pub use wsse_core::{algorithm, ns};
pub use wsse_crypto as crypto;
pub use wsse_dsig as dsig;
pub use wsse_enc as enc;
pub use wsse_keys as keys;
pub use wsse_xml as xml;
