#![forbid(unsafe_code)]

//! Key and certificate files, loaded before any document is touched.

use crate::error::{Error, Result};
use std::path::Path;
use wsse_keys::{loader, Certificate, Key};

fn key_material(path: &Path) -> impl FnOnce(wsse_core::Error) -> Error + '_ {
    move |source| Error::KeyMaterial {
        path: path.to_path_buf(),
        source,
    }
}

/// Load an RSA private key (PKCS#8 or PKCS#1, PEM or DER).
pub fn load_private_key(path: &Path) -> Result<Key> {
    loader::load_key_file(path).map_err(key_material(path))
}

/// Load an X.509 certificate (PEM or DER).
pub fn load_certificate(path: &Path) -> Result<Certificate> {
    loader::load_cert_file(path).map_err(key_material(path))
}

/// Load a certificate together with the RSA public key it carries.
pub fn load_certificate_key(path: &Path) -> Result<(Certificate, Key)> {
    let cert = load_certificate(path)?;
    let key = cert.to_key().map_err(key_material(path))?;
    Ok((cert, key))
}
