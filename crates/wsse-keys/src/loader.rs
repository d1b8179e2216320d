#![forbid(unsafe_code)]

//! Key and certificate loading from PEM and DER.

use crate::key::{Key, KeyData, KeyUsage};
use crate::x509::Certificate;
use std::path::Path;
use wsse_core::Error;

/// Load an RSA private key from PEM data (PKCS#8, then PKCS#1).
pub fn load_rsa_private_pem(pem_data: &[u8]) -> Result<Key, Error> {
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    use pkcs8::DecodePrivateKey;
    let private = match rsa::RsaPrivateKey::from_pkcs8_pem(pem_str) {
        Ok(pk) => pk,
        Err(_) => {
            use pkcs1::DecodeRsaPrivateKey;
            rsa::RsaPrivateKey::from_pkcs1_pem(pem_str)
                .map_err(|e| Error::Key(format!("failed to parse RSA private key PEM: {e}")))?
        }
    };
    let public = private.to_public_key();
    Ok(Key::new(
        KeyData::Rsa {
            private: Some(private),
            public,
        },
        KeyUsage::Any,
    ))
}

/// Load an RSA private key from DER data (PKCS#8, then PKCS#1).
pub fn load_rsa_private_der(data: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;
    let private = match rsa::RsaPrivateKey::from_pkcs8_der(data) {
        Ok(pk) => pk,
        Err(_) => {
            use pkcs1::DecodeRsaPrivateKey;
            rsa::RsaPrivateKey::from_pkcs1_der(data)
                .map_err(|e| Error::Key(format!("failed to parse RSA private key DER: {e}")))?
        }
    };
    let public = private.to_public_key();
    Ok(Key::new(
        KeyData::Rsa {
            private: Some(private),
            public,
        },
        KeyUsage::Any,
    ))
}

/// Load a public key from a PEM X.509 certificate.
pub fn load_x509_cert_pem(pem_data: &[u8]) -> Result<Key, Error> {
    Certificate::from_pem(pem_data)?.to_key()
}

/// Load a public key from a DER X.509 certificate.
pub fn load_x509_cert_der(data: &[u8]) -> Result<Key, Error> {
    Certificate::from_der(data)?.to_key()
}

/// Load a private key file, PEM or DER.
pub fn load_key_file(path: &Path) -> Result<Key, Error> {
    let data = std::fs::read(path)?;
    let key = if data.starts_with(b"-----BEGIN") {
        load_rsa_private_pem(&data)?
    } else {
        load_rsa_private_der(&data)?
    };
    tracing::debug!(path = %path.display(), key = ?key.data, "loaded private key");
    Ok(key)
}

/// Load a certificate file, PEM or DER.
pub fn load_cert_file(path: &Path) -> Result<Certificate, Error> {
    let data = std::fs::read(path)?;
    let cert = if data.starts_with(b"-----BEGIN") {
        Certificate::from_pem(&data)?
    } else {
        Certificate::from_der(&data)?
    };
    tracing::debug!(
        path = %path.display(),
        issuer = %cert.issuer_name(),
        serial = %cert.serial_number(),
        "loaded certificate"
    );
    Ok(cert)
}

/// Load a private key and attach the certificate that carries its public half.
pub fn load_key_pair(key_path: &Path, cert_path: &Path) -> Result<Key, Error> {
    let cert = load_cert_file(cert_path)?;
    let key = load_key_file(key_path)?;
    if let (Some(public), Ok(cert_public)) = (key.rsa_public_key(), cert.public_key()) {
        if *public != cert_public {
            tracing::warn!(
                key = %key_path.display(),
                cert = %cert_path.display(),
                "private key does not match certificate"
            );
        }
    }
    Ok(key.with_certificate(cert.der().to_vec()))
}
