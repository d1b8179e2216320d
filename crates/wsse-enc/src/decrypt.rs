#![forbid(unsafe_code)]

//! XML-Enc decryption.
//!
//! Processing order:
//! 1. Read the `EncryptionMethod` of `<EncryptedData>`
//! 2. Resolve the key from `KeyInfo`: `EncryptedKey`, `RetrievalMethod`
//!    pointing at one, or `KeyName`
//! 3. Decrypt `CipherData/CipherValue`
//! 4. Parse the plaintext in the context of the `EncryptedData`'s parent
//!    and put it where the `EncryptedData` was

use crate::context::EncContext;
use crate::{cipher_value, decode_base64, encryption_method, oaep_digest};
use wsse_core::{algorithm, ns, Error};
use wsse_crypto::{cipher, keytransport};
use wsse_xml::{xpath, Document, NodeId};

/// Decrypt `enc_data` in place. Returns the nodes that replaced it.
pub fn decrypt(ctx: &EncContext, doc: &mut Document, enc_data: NodeId) -> Result<Vec<NodeId>, Error> {
    let enc_uri = encryption_method(doc, enc_data)?;
    let cipher_alg = cipher::from_uri(&enc_uri)?;
    let key = resolve_decryption_key(ctx, doc, enc_data)?;

    let value = cipher_value(doc, enc_data)?;
    let ciphertext = decode_base64(&doc.text(value), "CipherValue")?;
    let plaintext = cipher_alg.decrypt(&key, &ciphertext)?;
    let plaintext = String::from_utf8(plaintext)
        .map_err(|e| Error::Decryption(format!("plaintext is not valid UTF-8: {e}")))?;

    let parent = doc
        .parent(enc_data)
        .ok_or_else(|| Error::XmlStructure("EncryptedData is detached".into()))?;
    let nodes = doc.import_fragment(&plaintext, parent)?;
    doc.replace(enc_data, &nodes)?;

    tracing::debug!(algorithm = %enc_uri, nodes = nodes.len(), "decrypted data");
    Ok(nodes)
}

/// Unwrap the session key held by an `EncryptedKey` with the first RSA
/// private key of the context.
pub fn decrypt_key(ctx: &EncContext, doc: &Document, encrypted_key: NodeId) -> Result<Vec<u8>, Error> {
    let uri = encryption_method(doc, encrypted_key)?;
    let digest = oaep_digest(doc, encrypted_key);
    let transport = keytransport::from_uri_with_digest(&uri, digest.as_deref())?;
    let private_key = ctx
        .keys_manager
        .find_rsa_private()
        .and_then(|k| k.rsa_private_key())
        .ok_or_else(|| Error::KeyNotFound("no RSA private key for EncryptedKey".into()))?;
    let value = cipher_value(doc, encrypted_key)?;
    let wrapped = decode_base64(&doc.text(value), "EncryptedKey CipherValue")?;
    transport.decrypt(private_key, &wrapped)
}

fn resolve_decryption_key(ctx: &EncContext, doc: &Document, enc_data: NodeId) -> Result<Vec<u8>, Error> {
    let Some(key_info) = doc.find_child(enc_data, ns::DSIG, ns::node::KEY_INFO) else {
        return Err(Error::KeyNotFound("EncryptedData has no KeyInfo".into()));
    };

    // Several EncryptedKeys may be present; the first one we can open wins.
    let mut last_error = None;
    for ek in doc.find_children(key_info, ns::ENC, ns::node::ENCRYPTED_KEY) {
        match decrypt_key(ctx, doc, ek) {
            Ok(key) => return Ok(key),
            Err(e) => last_error = Some(e),
        }
    }

    for child in doc.child_elements(key_info) {
        if doc.is_named(child, ns::DSIG, ns::node::RETRIEVAL_METHOD)
            && doc.attribute(child, ns::attr::TYPE) == Some(algorithm::ENCRYPTED_KEY)
        {
            if let Some(uri) = doc.attribute(child, ns::attr::URI) {
                let target = xpath::resolve_uri(doc, uri)?;
                return decrypt_key(ctx, doc, target);
            }
        }
        if doc.is_named(child, ns::DSIG, ns::node::KEY_NAME) {
            let name = doc.text(child);
            if let Some(bytes) = ctx
                .keys_manager
                .find_by_name(name.trim())
                .and_then(|k| k.symmetric_key_bytes())
            {
                return Ok(bytes.to_vec());
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::KeyNotFound("no usable key in KeyInfo".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encrypt::encrypt;
    use wsse_keys::{loader, Key, KeyData, KeyUsage, KeysManager};
    use wsse_xml::writer;

    fn keys_dir() -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-data/keys")
    }

    fn template(doc: &mut Document, content: bool, with_key: bool) -> NodeId {
        let xml = format!(
            r#"<xenc:EncryptedData xmlns:xenc="{enc}" xmlns:ds="{dsig}" Type="{ty}"><xenc:EncryptionMethod Algorithm="{des}"/>{ki}<xenc:CipherData><xenc:CipherValue/></xenc:CipherData></xenc:EncryptedData>"#,
            enc = ns::ENC,
            dsig = ns::DSIG,
            ty = if content { ns::ENC_TYPE_CONTENT } else { ns::ENC_TYPE_ELEMENT },
            des = algorithm::TRIPLEDES_CBC,
            ki = if with_key {
                format!(
                    r#"<ds:KeyInfo><xenc:EncryptedKey><xenc:EncryptionMethod Algorithm="{}"/><xenc:CipherData><xenc:CipherValue/></xenc:CipherData></xenc:EncryptedKey></ds:KeyInfo>"#,
                    algorithm::RSA_OAEP
                )
            } else {
                r#"<ds:KeyInfo><ds:KeyName>shared</ds:KeyName></ds:KeyInfo>"#.to_owned()
            },
        );
        let root = doc.document_element().unwrap();
        doc.import_fragment(&xml, root).unwrap()[0]
    }

    fn sender() -> EncContext {
        let mut keys = KeysManager::new();
        keys.add_key(loader::load_x509_cert_pem(&std::fs::read(keys_dir().join("cert.pem")).unwrap()).unwrap());
        EncContext::new(keys)
    }

    fn recipient() -> EncContext {
        let mut keys = KeysManager::new();
        keys.add_key(loader::load_key_file(&keys_dir().join("key.pem")).unwrap());
        EncContext::new(keys)
    }

    const DOC: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><Foo xmlns="http://example.com">Text</Foo></soap:Body></soap:Envelope>"#;

    #[test]
    fn test_element_round_trip_with_encrypted_key() {
        let mut doc = Document::parse(DOC).unwrap();
        let env = doc.document_element().unwrap();
        let body = doc.first_child_element(env).unwrap();
        let foo = doc.first_child_element(body).unwrap();
        let tpl = template(&mut doc, false, true);

        let key = encrypt(&sender(), &mut doc, tpl, foo, None).unwrap();
        assert_eq!(key.len(), 24);
        let xml = writer::to_string(&doc);
        assert!(!xml.contains("Text"));

        let mut doc = Document::parse(&xml).unwrap();
        let env = doc.document_element().unwrap();
        let body = doc.first_child_element(env).unwrap();
        let enc_data = doc.first_child_element(body).unwrap();
        let nodes = decrypt(&recipient(), &mut doc, enc_data).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(writer::to_string(&doc), DOC);
    }

    #[test]
    fn test_content_round_trip_with_key_name() {
        let mut keys = KeysManager::new();
        keys.add_key(Key::new(KeyData::Symmetric(vec![0x42; 24]), KeyUsage::Any).with_name("shared"));
        let ctx = EncContext::new(keys);

        let mut doc = Document::parse(DOC).unwrap();
        let env = doc.document_element().unwrap();
        let body = doc.first_child_element(env).unwrap();
        let tpl = template(&mut doc, true, false);
        encrypt(&ctx, &mut doc, tpl, body, Some(&[0x42u8; 24][..])).unwrap();
        assert_eq!(doc.first_child_element(body), Some(tpl));

        decrypt(&ctx, &mut doc, tpl).unwrap();
        assert_eq!(writer::to_string(&doc), DOC);
    }

    #[test]
    fn test_wrong_private_key_fails() {
        let mut doc = Document::parse(DOC).unwrap();
        let env = doc.document_element().unwrap();
        let body = doc.first_child_element(env).unwrap();
        let foo = doc.first_child_element(body).unwrap();
        let tpl = template(&mut doc, false, true);
        encrypt(&sender(), &mut doc, tpl, foo, None).unwrap();

        let mut keys = KeysManager::new();
        keys.add_key(loader::load_key_file(&keys_dir().join("their_key.pem")).unwrap());
        assert!(decrypt(&EncContext::new(keys), &mut doc, tpl).is_err());
    }

    #[test]
    fn test_missing_key_info() {
        let mut doc = Document::parse(DOC).unwrap();
        let env = doc.document_element().unwrap();
        let body = doc.first_child_element(env).unwrap();
        let xml = format!(
            r#"<EncryptedData xmlns="{}"><EncryptionMethod Algorithm="{}"/><CipherData><CipherValue>AAAA</CipherValue></CipherData></EncryptedData>"#,
            ns::ENC,
            algorithm::TRIPLEDES_CBC
        );
        let ed = doc.import_fragment(&xml, body).unwrap()[0];
        doc.append_child(body, ed).unwrap();
        assert!(matches!(decrypt(&recipient(), &mut doc, ed), Err(Error::KeyNotFound(_))));
    }
}
