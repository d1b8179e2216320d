#![forbid(unsafe_code)]

//! Verification key resolution from `KeyInfo`.
//!
//! Understands the key references WS-Security peers send: an embedded
//! `X509Certificate`, a `wsse:Reference` to a `BinarySecurityToken`, an
//! `X509IssuerSerial` matched against the keys manager, and `KeyName`.

use crate::decode_base64;
use wsse_core::{ns, Error};
use wsse_crypto::SigningKey;
use wsse_keys::{Certificate, KeysManager};
use wsse_xml::{xpath, Document, NodeId};

/// Resolve the key that should verify a signature.
///
/// Falls back to the first RSA key of the manager when `KeyInfo` is absent
/// or names nothing the manager holds.
pub fn resolve_verification_key(
    doc: &Document,
    key_info: Option<NodeId>,
    keys: &KeysManager,
) -> Result<SigningKey, Error> {
    if let Some(key_info) = key_info {
        if let Some(key) = from_key_info(doc, key_info, keys)? {
            return Ok(key);
        }
    }
    keys.find_rsa()
        .and_then(|k| k.to_signing_key())
        .ok_or_else(|| Error::KeyNotFound("no RSA key to verify with".into()))
}

fn from_key_info(
    doc: &Document,
    key_info: NodeId,
    keys: &KeysManager,
) -> Result<Option<SigningKey>, Error> {
    for node in doc.descendants(key_info) {
        if doc.is_named(node, ns::DSIG, ns::node::X509_CERTIFICATE) {
            let der = decode_base64(&doc.text(node), "X509Certificate")?;
            let cert = Certificate::from_der(&der)?;
            return Ok(Some(SigningKey::RsaPublic(cert.public_key()?)));
        }
        if doc.is_named(node, ns::WSSE, ns::node::WSSE_REFERENCE) {
            let uri = doc
                .attribute(node, ns::attr::URI)
                .ok_or_else(|| Error::MissingAttribute("URI on wsse:Reference".into()))?;
            let token = xpath::resolve_uri(doc, uri)?;
            let der = decode_base64(&doc.text(token), "BinarySecurityToken")?;
            let cert = Certificate::from_der(&der)?;
            return Ok(Some(SigningKey::RsaPublic(cert.public_key()?)));
        }
        if doc.is_named(node, ns::DSIG, ns::node::X509_ISSUER_SERIAL) {
            let issuer = doc
                .find_child(node, ns::DSIG, ns::node::X509_ISSUER_NAME)
                .map(|n| doc.text(n))
                .unwrap_or_default();
            let serial = doc
                .find_child(node, ns::DSIG, ns::node::X509_SERIAL_NUMBER)
                .map(|n| doc.text(n))
                .unwrap_or_default();
            match keys.find_by_issuer_serial(issuer.trim(), serial.trim()) {
                Some(key) => return Ok(key.to_signing_key()),
                None => tracing::warn!(
                    issuer = issuer.trim(),
                    serial = serial.trim(),
                    "no certificate matches X509IssuerSerial"
                ),
            }
        }
        if doc.is_named(node, ns::DSIG, ns::node::KEY_NAME) {
            if let Some(key) = keys.find_by_name(doc.text(node).trim()) {
                return Ok(key.to_signing_key());
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsse_keys::loader;

    fn cert_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../test-data/keys")
            .join(name)
    }

    #[test]
    fn test_embedded_certificate() {
        let cert = loader::load_cert_file(&cert_path("cert.pem")).unwrap();
        let xml = format!(
            r#"<KeyInfo xmlns="{}"><X509Data><X509Certificate>{}</X509Certificate></X509Data></KeyInfo>"#,
            ns::DSIG,
            crate::encode_base64(cert.der())
        );
        let doc = Document::parse(&xml).unwrap();
        let ki = doc.document_element().unwrap();
        let key = resolve_verification_key(&doc, Some(ki), &KeysManager::new()).unwrap();
        assert!(matches!(key, SigningKey::RsaPublic(_)));
    }

    #[test]
    fn test_issuer_serial_miss_falls_back_to_manager() {
        let xml = format!(
            r#"<KeyInfo xmlns="{}"><X509Data><X509IssuerSerial><X509IssuerName>CN=nobody</X509IssuerName><X509SerialNumber>1</X509SerialNumber></X509IssuerSerial></X509Data></KeyInfo>"#,
            ns::DSIG
        );
        let doc = Document::parse(&xml).unwrap();
        let ki = doc.document_element().unwrap();
        let mut keys = KeysManager::new();
        keys.add_key(loader::load_cert_file(&cert_path("cert.pem")).unwrap().to_key().unwrap());
        assert!(resolve_verification_key(&doc, Some(ki), &keys).is_ok());
        assert!(matches!(
            resolve_verification_key(&doc, Some(ki), &KeysManager::new()),
            Err(Error::KeyNotFound(_))
        ));
    }
}
