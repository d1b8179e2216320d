#![forbid(unsafe_code)]

//! Key management for the wsse engines.
//!
//! Loads RSA private keys (PKCS#8 or PKCS#1 PEM) and X.509 certificates
//! (PEM or DER), exposes the issuer name and serial number WS-Security
//! key references carry, and provides a [`KeysManager`] for lookup.

pub mod key;
pub mod loader;
pub mod manager;
pub mod x509;

pub use key::{Key, KeyData, KeyUsage};
pub use manager::KeysManager;
pub use x509::Certificate;
