#![forbid(unsafe_code)]

//! Builders for the WS-Security token and reference elements.

use crate::id::{ensure_id, fragment};
use base64::Engine;
use wsse_core::{ns, Error};
use wsse_keys::Certificate;
use wsse_xml::{Document, NodeId};

/// `wsse:BinarySecurityToken` holding the base64 DER of `cert`.
///
/// The token gets no identifier until something references it.
pub fn create_binary_security_token(doc: &mut Document, cert: &Certificate) -> NodeId {
    let bst = doc.create_element(ns::WSSE, Some(ns::prefix::WSSE), ns::node::BINARY_SECURITY_TOKEN);
    doc.set_attribute(bst, ns::attr::ENCODING_TYPE, ns::BASE64B);
    doc.set_attribute(bst, ns::attr::VALUE_TYPE, ns::X509TOKEN);
    let der = base64::engine::general_purpose::STANDARD.encode(cert.der());
    doc.set_text(bst, &der);
    bst
}

/// An empty `wsse:SecurityTokenReference`.
pub fn create_security_token_reference(doc: &mut Document) -> NodeId {
    doc.create_element(ns::WSSE, Some(ns::prefix::WSSE), ns::node::SECURITY_TOKEN_REFERENCE)
}

/// `ds:KeyInfo/wsse:SecurityTokenReference/wsse:Reference` pointing at
/// `bst` by identifier.
pub fn create_key_info_bst(doc: &mut Document, bst: NodeId) -> Result<NodeId, Error> {
    let id = ensure_id(doc, bst);

    let key_info = doc.create_element(ns::DSIG, Some(ns::prefix::DSIG), ns::node::KEY_INFO);
    let str_node = create_security_token_reference(doc);
    doc.set_attribute_ns(str_node, ns::WSSE, ns::prefix::WSSE, ns::attr::TOKEN_TYPE, ns::X509TOKEN);
    let reference = doc.create_element(ns::WSSE, Some(ns::prefix::WSSE), ns::node::WSSE_REFERENCE);
    doc.set_attribute(reference, ns::attr::VALUE_TYPE, ns::X509TOKEN);
    doc.set_attribute(reference, ns::attr::URI, &fragment(&id));

    doc.append_child(str_node, reference)?;
    doc.append_child(key_info, str_node)?;
    Ok(key_info)
}

/// Record `enc_data` in the `xenc:ReferenceList` of `enc_key`, creating
/// the list if needed. Returns the identifier of `enc_data`.
pub fn add_data_reference(doc: &mut Document, enc_key: NodeId, enc_data: NodeId) -> Result<String, Error> {
    let id = ensure_id(doc, enc_data);
    let list = match doc.find_child(enc_key, ns::ENC, ns::node::REFERENCE_LIST) {
        Some(list) => list,
        None => {
            let list = doc.create_element(ns::ENC, Some(ns::prefix::ENC), ns::node::REFERENCE_LIST);
            doc.append_child(enc_key, list)?;
            list
        }
    };
    let data_ref = doc.create_element(ns::ENC, Some(ns::prefix::ENC), ns::node::DATA_REFERENCE);
    doc.set_attribute(data_ref, ns::attr::URI, &fragment(&id));
    doc.append_child(list, data_ref)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::register_id_attrs;
    use wsse_xml::xpath;

    fn cert() -> Certificate {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../test-data/keys/cert.der");
        Certificate::from_der(&std::fs::read(path).unwrap()).unwrap()
    }

    fn header_doc() -> (Document, NodeId) {
        let mut doc = Document::parse(&format!(r#"<wsse:Security xmlns:wsse="{}"/>"#, ns::WSSE)).unwrap();
        register_id_attrs(&mut doc);
        let security = doc.document_element().unwrap();
        (doc, security)
    }

    #[test]
    fn test_binary_security_token() {
        let (mut doc, security) = header_doc();
        let cert = cert();
        let bst = create_binary_security_token(&mut doc, &cert);
        doc.append_child(security, bst).unwrap();

        assert_eq!(doc.attribute(bst, ns::attr::VALUE_TYPE), Some(ns::X509TOKEN));
        assert_eq!(doc.attribute(bst, ns::attr::ENCODING_TYPE), Some(ns::BASE64B));
        assert!(doc.attribute_ns(bst, ns::WSU, ns::attr::ID).is_none());
        let der = base64::engine::general_purpose::STANDARD.decode(doc.text(bst)).unwrap();
        assert_eq!(der, cert.der());
    }

    #[test]
    fn test_key_info_references_token() {
        let (mut doc, security) = header_doc();
        let bst = create_binary_security_token(&mut doc, &cert());
        doc.append_child(security, bst).unwrap();
        let key_info = create_key_info_bst(&mut doc, bst).unwrap();
        doc.append_child(security, key_info).unwrap();

        let reference = doc.find_descendant(key_info, ns::WSSE, ns::node::WSSE_REFERENCE).unwrap();
        let uri = doc.attribute(reference, ns::attr::URI).unwrap();
        assert_eq!(xpath::resolve_uri(&doc, uri).unwrap(), bst);
        let str_node = doc.parent(reference).unwrap();
        assert_eq!(
            doc.attribute_ns(str_node, ns::WSSE, ns::attr::TOKEN_TYPE),
            Some(ns::X509TOKEN)
        );
    }

    #[test]
    fn test_data_references_extend_the_list() {
        let (mut doc, security) = header_doc();
        let enc_key = doc.create_element(ns::ENC, Some("xenc"), ns::node::ENCRYPTED_KEY);
        let first = doc.create_element(ns::ENC, Some("xenc"), ns::node::ENCRYPTED_DATA);
        let second = doc.create_element(ns::ENC, Some("xenc"), ns::node::ENCRYPTED_DATA);
        for node in [enc_key, first, second] {
            doc.append_child(security, node).unwrap();
        }

        let id1 = add_data_reference(&mut doc, enc_key, first).unwrap();
        let id2 = add_data_reference(&mut doc, enc_key, second).unwrap();
        assert_ne!(id1, id2);

        let lists = doc.find_children(enc_key, ns::ENC, ns::node::REFERENCE_LIST);
        assert_eq!(lists.len(), 1);
        let uris: Vec<_> = doc
            .find_children(lists[0], ns::ENC, ns::node::DATA_REFERENCE)
            .into_iter()
            .map(|r| doc.attribute(r, ns::attr::URI).unwrap().to_owned())
            .collect();
        assert_eq!(uris, vec![format!("#{id1}"), format!("#{id2}")]);
    }
}
