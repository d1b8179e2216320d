#![forbid(unsafe_code)]

//! XML-Enc encryption.
//!
//! The template is an `<EncryptedData>` element with an empty
//! `<CipherValue>`; it may carry `KeyInfo/EncryptedKey` children whose own
//! `CipherValue` receives the wrapped session key.

use crate::context::EncContext;
use crate::{cipher_value, encode_base64, encryption_method, oaep_digest};
use wsse_core::{ns, Error};
use wsse_crypto::{cipher, keytransport};
use wsse_xml::{writer, Document, NodeId};

/// Encrypt `target` into `template` and put the template in its place.
///
/// With `Type="...#Content"` only the children of `target` are encrypted
/// and the template becomes its sole child; otherwise `target` itself is
/// replaced. A fresh session key is generated unless one is supplied.
/// Returns the session key used.
pub fn encrypt(
    ctx: &EncContext,
    doc: &mut Document,
    template: NodeId,
    target: NodeId,
    session_key: Option<&[u8]>,
) -> Result<Vec<u8>, Error> {
    if !doc.is_element(target) {
        return Err(Error::Encryption("encryption target is not an element".into()));
    }
    let enc_uri = encryption_method(doc, template)?;
    let cipher_alg = cipher::from_uri(&enc_uri)?;
    let key = match session_key {
        Some(k) => k.to_vec(),
        None => cipher::generate_key(&enc_uri)?,
    };

    let content = doc.attribute(template, ns::attr::TYPE) == Some(ns::ENC_TYPE_CONTENT);
    let plaintext = if content {
        let scope = doc.in_scope_namespaces(target);
        let mut out = String::new();
        for child in doc.children(target) {
            writer::write_node(doc, *child, &scope, &mut out);
        }
        out
    } else {
        writer::node_to_string(doc, target)
    };

    let ciphertext = cipher_alg.encrypt(&key, plaintext.as_bytes())?;
    let value = cipher_value(doc, template)?;
    doc.set_text(value, &encode_base64(&ciphertext));

    let encrypted_keys: Vec<NodeId> = doc
        .descendants(template)
        .into_iter()
        .filter(|n| doc.is_named(*n, ns::ENC, ns::node::ENCRYPTED_KEY))
        .collect();
    for encrypted_key in encrypted_keys {
        encrypt_key(ctx, doc, encrypted_key, &key)?;
    }

    if content {
        for child in doc.children(target).to_vec() {
            doc.detach(child);
        }
        doc.append_child(target, template)?;
    } else {
        doc.replace(target, &[template])?;
    }

    tracing::debug!(
        algorithm = %enc_uri,
        plaintext = plaintext.len(),
        content,
        "encrypted data"
    );
    Ok(key)
}

/// Wrap `session_key` into the `CipherValue` of an `EncryptedKey`, using
/// the first RSA key of the context.
pub fn encrypt_key(
    ctx: &EncContext,
    doc: &mut Document,
    encrypted_key: NodeId,
    session_key: &[u8],
) -> Result<(), Error> {
    let uri = encryption_method(doc, encrypted_key)?;
    let digest = oaep_digest(doc, encrypted_key);
    let transport = keytransport::from_uri_with_digest(&uri, digest.as_deref())?;
    let public_key = ctx
        .keys_manager
        .find_rsa()
        .and_then(|k| k.rsa_public_key())
        .ok_or_else(|| Error::KeyNotFound("no RSA key for EncryptedKey".into()))?;
    let wrapped = transport.encrypt(public_key, session_key)?;
    let value = cipher_value(doc, encrypted_key)?;
    doc.set_text(value, &encode_base64(&wrapped));
    Ok(())
}
