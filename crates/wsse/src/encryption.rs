#![forbid(unsafe_code)]

//! WS-Security encryption of the first body element.
//!
//! The generic engine leaves the `EncryptedKey` nested in the
//! `EncryptedData`'s `KeyInfo`. WS-Security wants it in `Security`,
//! naming the recipient certificate through a `BinarySecurityToken`, and
//! listing the data it protects in a `ReferenceList`. The result is
//!
//! ```text
//! Security
//!   BinarySecurityToken         wsu:Id=A
//!   EncryptedKey
//!     EncryptionMethod
//!     KeyInfo/SecurityTokenReference/Reference  URI=#A
//!     CipherData
//!     ReferenceList/DataReference               URI=#B
//!   ...previous children
//! Body
//!   EncryptedData               wsu:Id=B
//! ```

use crate::config::EncryptionConfig;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::material;
use crate::token::{add_data_reference, create_binary_security_token, create_key_info_bst};
use std::path::Path;
use wsse_core::ns;
use wsse_enc::EncContext;
use wsse_keys::{Certificate, KeysManager};
use wsse_xml::{Document, NodeId};

/// Encrypt the first child element of `Body` for the holder of `cert_file`,
/// with 3DES-CBC and an RSA-OAEP wrapped session key.
///
/// Further `Body` children stay in plaintext.
pub fn encrypt(envelope: &[u8], cert_file: &Path) -> Result<Vec<u8>> {
    encrypt_with(envelope, cert_file, &EncryptionConfig::default())
}

pub fn encrypt_with(envelope: &[u8], cert_file: &Path, config: &EncryptionConfig) -> Result<Vec<u8>> {
    let (cert, key) = material::load_certificate_key(cert_file)?;

    let mut env = Envelope::parse(envelope)?;
    let security = env.security()?;
    let body = env.body()?;
    let target = env
        .doc
        .first_child_element(body)
        .ok_or_else(|| Error::MissingElement("Body child element".into()))?;

    let template = build_template(&mut env.doc, config).map_err(Error::EncryptionFailed)?;
    let mut manager = KeysManager::new();
    manager.add_key(key);
    let ctx = EncContext::new(manager);
    wsse_enc::encrypt(&ctx, &mut env.doc, template, target, None).map_err(Error::EncryptionFailed)?;

    let data_id = rewire(&mut env.doc, security, template, &cert).map_err(Error::EncryptionFailed)?;
    tracing::debug!(id = %data_id, subject = %cert.subject_name(), "encrypted body element");
    Ok(env.to_bytes())
}

/// `EncryptedData` with a nested `EncryptedKey`, both with empty
/// `CipherValue`s.
fn build_template(doc: &mut Document, config: &EncryptionConfig) -> wsse_core::Result<NodeId> {
    let enc_data = enc_element(doc, ns::node::ENCRYPTED_DATA);
    doc.set_attribute(enc_data, ns::attr::TYPE, ns::ENC_TYPE_ELEMENT);
    let method = enc_element(doc, ns::node::ENCRYPTION_METHOD);
    doc.set_attribute(method, ns::attr::ALGORITHM, &config.data_method);
    doc.append_child(enc_data, method)?;

    let key_info = doc.create_element(ns::DSIG, Some(ns::prefix::DSIG), ns::node::KEY_INFO);
    doc.append_child(enc_data, key_info)?;
    let enc_key = enc_element(doc, ns::node::ENCRYPTED_KEY);
    doc.append_child(key_info, enc_key)?;
    let key_method = enc_element(doc, ns::node::ENCRYPTION_METHOD);
    doc.set_attribute(key_method, ns::attr::ALGORITHM, &config.key_transport);
    if let Some(digest) = &config.oaep_digest {
        let digest_method = doc.create_element(ns::DSIG, Some(ns::prefix::DSIG), ns::node::DIGEST_METHOD);
        doc.set_attribute(digest_method, ns::attr::ALGORITHM, digest);
        doc.append_child(key_method, digest_method)?;
    }
    doc.append_child(enc_key, key_method)?;
    append_cipher_data(doc, enc_key)?;

    append_cipher_data(doc, enc_data)?;
    Ok(enc_data)
}

fn enc_element(doc: &mut Document, local: &str) -> NodeId {
    doc.create_element(ns::ENC, Some(ns::prefix::ENC), local)
}

fn append_cipher_data(doc: &mut Document, parent: NodeId) -> wsse_core::Result<()> {
    let cipher_data = enc_element(doc, ns::node::CIPHER_DATA);
    let cipher_value = enc_element(doc, ns::node::CIPHER_VALUE);
    doc.append_child(cipher_data, cipher_value)?;
    doc.append_child(parent, cipher_data)
}

/// Move the `EncryptedKey` into `Security` behind a fresh token and point
/// it at the `EncryptedData`. Returns the `EncryptedData` identifier.
fn rewire(
    doc: &mut Document,
    security: NodeId,
    enc_data: NodeId,
    cert: &Certificate,
) -> wsse_core::Result<String> {
    let nested_key_info = doc
        .find_child(enc_data, ns::DSIG, ns::node::KEY_INFO)
        .ok_or_else(|| wsse_core::Error::MissingElement("KeyInfo in EncryptedData".into()))?;
    let enc_key = doc
        .find_child(nested_key_info, ns::ENC, ns::node::ENCRYPTED_KEY)
        .ok_or_else(|| wsse_core::Error::MissingElement("EncryptedKey in KeyInfo".into()))?;

    doc.detach(enc_key);
    doc.insert_child(security, 0, enc_key)?;

    let bst = create_binary_security_token(doc, cert);
    doc.insert_child(security, 0, bst)?;

    let key_info = create_key_info_bst(doc, bst)?;
    let after_method = doc
        .find_child(enc_key, ns::ENC, ns::node::ENCRYPTION_METHOD)
        .and_then(|m| doc.index_in_parent(m))
        .map_or(0, |i| i + 1);
    doc.insert_child(enc_key, after_method, key_info)?;

    let id = add_data_reference(doc, enc_key, enc_data)?;
    doc.detach(nested_key_info);
    Ok(id)
}
