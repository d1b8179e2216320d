#![forbid(unsafe_code)]

//! WS-Security decryption.
//!
//! Every `DataReference` of the `EncryptedKey` in `Security` names an
//! `EncryptedData`. The generic engine expects the `EncryptedKey` inside
//! the `EncryptedData`'s own `KeyInfo`, so each referenced block gets a
//! fresh `KeyInfo` holding its own copy of the key before it is decrypted
//! in place.

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::material;
use std::path::Path;
use wsse_core::ns;
use wsse_enc::EncContext;
use wsse_keys::KeysManager;
use wsse_xml::{xpath, Document, NodeId};

/// Decrypt every block the `EncryptedKey` in `Security` references, using
/// the private key in `key_file`.
pub fn decrypt(envelope: &[u8], key_file: &Path) -> Result<Vec<u8>> {
    let key = material::load_private_key(key_file)?;

    let mut env = Envelope::parse(envelope)?;
    let security = env.security()?;
    let enc_key = env
        .doc
        .find_child(security, ns::ENC, ns::node::ENCRYPTED_KEY)
        .ok_or_else(|| Error::MissingElement("xenc:EncryptedKey".into()))?;
    let uris = data_references(&env.doc, enc_key)?;

    let mut manager = KeysManager::new();
    manager.add_key(key);
    let ctx = EncContext::new(manager);

    for uri in &uris {
        let enc_data = xpath::resolve_uri(&env.doc, uri)
            .map_err(|e| Error::ReferenceResolutionFailed(e.to_string()))?;
        if !env.doc.is_named(enc_data, ns::ENC, ns::node::ENCRYPTED_DATA) {
            return Err(Error::ReferenceResolutionFailed(format!(
                "{uri} does not name an EncryptedData"
            )));
        }
        attach_key(&mut env.doc, enc_data, enc_key).map_err(Error::DecryptionFailed)?;
        wsse_enc::decrypt(&ctx, &mut env.doc, enc_data).map_err(Error::DecryptionFailed)?;
        tracing::debug!(%uri, "decrypted data reference");
    }

    env.doc.detach(enc_key);
    Ok(env.to_bytes())
}

/// URIs of the `DataReference`s, in document order.
fn data_references(doc: &Document, enc_key: NodeId) -> Result<Vec<String>> {
    let missing = |what: &str| Error::DecryptionFailed(wsse_core::Error::MissingElement(what.into()));
    let list = doc
        .find_child(enc_key, ns::ENC, ns::node::REFERENCE_LIST)
        .ok_or_else(|| missing("ReferenceList in EncryptedKey"))?;
    let uris = doc
        .find_children(list, ns::ENC, ns::node::DATA_REFERENCE)
        .into_iter()
        .map(|r| {
            doc.attribute(r, ns::attr::URI).map(str::to_owned).ok_or_else(|| {
                Error::DecryptionFailed(wsse_core::Error::MissingAttribute("URI on DataReference".into()))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if uris.is_empty() {
        return Err(missing("DataReference in ReferenceList"));
    }
    Ok(uris)
}

/// Replace the `KeyInfo` of `enc_data` with one holding a copy of
/// `enc_key`, right after `EncryptionMethod`.
fn attach_key(doc: &mut Document, enc_data: NodeId, enc_key: NodeId) -> wsse_core::Result<()> {
    if let Some(existing) = doc.find_child(enc_data, ns::DSIG, ns::node::KEY_INFO) {
        doc.detach(existing);
    }
    let key_info = doc.create_element(ns::DSIG, Some(ns::prefix::DSIG), ns::node::KEY_INFO);
    let copy = doc.deep_clone(enc_key);
    doc.append_child(key_info, copy)?;
    let index = doc
        .find_child(enc_data, ns::ENC, ns::node::ENCRYPTION_METHOD)
        .and_then(|m| doc.index_in_parent(m))
        .map_or(0, |i| i + 1);
    doc.insert_child(enc_data, index, key_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::encrypt;
    use wsse_xml::writer;

    fn key_path(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-data/keys").join(name)
    }

    fn fixture() -> Vec<u8> {
        std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/../../test-data/envelope.xml")).unwrap()
    }

    fn body_child(data: &[u8]) -> String {
        let env = Envelope::parse(data).unwrap();
        let body = env.body().unwrap();
        writer::node_to_string(&env.doc, env.doc.first_child_element(body).unwrap())
    }

    fn encrypted() -> String {
        String::from_utf8(encrypt(&fixture(), &key_path("cert.pem")).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let decrypted = decrypt(encrypted().as_bytes(), &key_path("key.pem")).unwrap();
        assert_eq!(body_child(&decrypted), body_child(&fixture()));
        assert_eq!(
            body_child(&decrypted),
            r#"<Foo xmlns="http://example.com">Text</Foo>"#
        );

        let env = Envelope::parse(&decrypted).unwrap();
        let security = env.security().unwrap();
        assert!(env.doc.find_child(security, ns::ENC, ns::node::ENCRYPTED_KEY).is_none());
        assert!(env
            .doc
            .find_child(security, ns::WSSE, ns::node::BINARY_SECURITY_TOKEN)
            .is_some());
        assert!(env.doc.find_descendant(env.root, ns::ENC, ns::node::ENCRYPTED_DATA).is_none());
    }

    #[test]
    fn test_missing_reference() {
        let xml = encrypted();
        let start = xml.find("<xenc:DataReference URI=\"#").unwrap() + "<xenc:DataReference URI=\"#".len();
        let end = start + xml[start..].find('"').unwrap();
        let broken = format!("{}id-nonexistent{}", &xml[..start], &xml[end..]);
        assert!(matches!(
            decrypt(broken.as_bytes(), &key_path("key.pem")),
            Err(Error::ReferenceResolutionFailed(_))
        ));
    }

    #[test]
    fn test_empty_reference_list() {
        let xml = encrypted();
        let start = xml.find("<xenc:ReferenceList>").unwrap();
        let end = xml.find("</xenc:ReferenceList>").unwrap() + "</xenc:ReferenceList>".len();
        let emptied = format!("{}<xenc:ReferenceList/>{}", &xml[..start], &xml[end..]);
        assert!(matches!(
            decrypt(emptied.as_bytes(), &key_path("key.pem")),
            Err(Error::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_wrong_key() {
        assert!(matches!(
            decrypt(encrypted().as_bytes(), &key_path("their_key.pem")),
            Err(Error::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_no_encrypted_key() {
        assert!(matches!(
            decrypt(&fixture(), &key_path("key.pem")),
            Err(Error::MissingElement(_))
        ));
    }

    #[test]
    fn test_two_blocks_share_one_key() {
        // A second EncryptedData under the same key, as a peer encrypting
        // two body elements would send it.
        let xml = encrypted();
        let mut env = Envelope::parse(xml.as_bytes()).unwrap();
        let security = env.security().unwrap();
        let enc_key = env.doc.find_child(security, ns::ENC, ns::node::ENCRYPTED_KEY).unwrap();
        let body = env.body().unwrap();
        let first = env.doc.first_child_element(body).unwrap();
        let second = env.doc.deep_clone(first);
        env.doc.append_child(body, second).unwrap();
        env.doc.set_attribute_ns(second, ns::WSU, "wsu", ns::attr::ID, "id-second");
        crate::token::add_data_reference(&mut env.doc, enc_key, second).unwrap();

        let decrypted = decrypt(&env.to_bytes(), &key_path("key.pem")).unwrap();
        let out = Envelope::parse(&decrypted).unwrap();
        let body = out.body().unwrap();
        let children: Vec<String> = out
            .doc
            .child_elements(body)
            .map(|c| writer::node_to_string(&out.doc, c))
            .collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], children[1]);
    }

    #[test]
    fn test_duplicate_data_reference_target() {
        let xml = encrypted();
        let mut env = Envelope::parse(xml.as_bytes()).unwrap();
        let body = env.body().unwrap();
        let enc_data = env.doc.first_child_element(body).unwrap();
        let copy = env.doc.deep_clone(enc_data);
        env.doc.insert_child(body, 0, copy).unwrap();
        assert!(matches!(
            decrypt(&env.to_bytes(), &key_path("key.pem")),
            Err(Error::ReferenceResolutionFailed(_))
        ));
    }
}
