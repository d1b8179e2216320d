#![forbid(unsafe_code)]

//! Serialization of arena documents.
//!
//! Namespace declarations are computed at write time from the bindings each
//! element needs, so subtrees that were moved, cloned or built detached
//! always serialize to well-formed, namespace-correct XML.

use crate::document::{apply_declarations, Document, NodeId, NodeKind};
use std::collections::BTreeMap;

/// Serialize the whole document (no XML declaration).
pub fn to_string(doc: &Document) -> String {
    let mut out = String::new();
    let scope = BTreeMap::new();
    for child in doc.children(doc.root()) {
        write_node(doc, *child, &scope, &mut out);
    }
    out
}

/// Serialize the whole document as UTF-8 bytes.
pub fn to_bytes(doc: &Document) -> Vec<u8> {
    to_string(doc).into_bytes()
}

/// Serialize a single node as a standalone fragment.
///
/// Every binding the subtree uses is declared on the fragment itself.
pub fn node_to_string(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &BTreeMap::new(), &mut out);
    out
}

/// Serialize `id` assuming `scope` is already in effect where it is written.
pub fn write_node(doc: &Document, id: NodeId, scope: &BTreeMap<String, String>, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Root => {
            for child in doc.children(id) {
                write_node(doc, *child, scope, out);
            }
        }
        NodeKind::Element(elem) => {
            let decls = doc.declared_namespaces(id, scope);
            let mut child_scope = scope.clone();
            apply_declarations(&mut child_scope, &decls);

            let name = elem.qualified_name();
            out.push('<');
            out.push_str(&name);
            for (prefix, uri) in &decls {
                if prefix.is_empty() {
                    out.push_str(" xmlns=\"");
                } else {
                    out.push_str(" xmlns:");
                    out.push_str(prefix);
                    out.push_str("=\"");
                }
                out.push_str(&escape_attr(uri));
                out.push('"');
            }
            for attr in &elem.attributes {
                out.push(' ');
                match (&attr.name.namespace, attr.prefix.as_deref()) {
                    (Some(_), Some(prefix)) if !prefix.is_empty() => {
                        out.push_str(prefix);
                        out.push(':');
                    }
                    _ => {}
                }
                out.push_str(&attr.name.local);
                out.push_str("=\"");
                out.push_str(&escape_attr(&attr.value));
                out.push('"');
            }

            let children = doc.children(id);
            if children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in children {
                write_node(doc, *child, &child_scope, out);
            }
            out.push_str("</");
            out.push_str(&name);
            out.push('>');
        }
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(data) = data.as_deref().filter(|d| !d.is_empty()) {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsse_core::ns;

    #[test]
    fn test_round_trip_preserves_markup() {
        let xml = r#"<a:root xmlns:a="urn:a" x="1"><b xmlns="urn:b">t &amp; u</b><c/></a:root>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(to_string(&doc), xml);
    }

    #[test]
    fn test_moved_node_gets_binding() {
        let xml = r#"<root><a:x xmlns:a="urn:a"><a:y a:attr="v"/></a:x><z/></root>"#;
        let mut doc = Document::parse(xml).unwrap();
        let root = doc.document_element().unwrap();
        let x = doc.first_child_element(root).unwrap();
        let y = doc.first_child_element(x).unwrap();
        let z = doc.find_child(root, "", "z").unwrap();
        doc.append_child(z, y).unwrap();
        assert_eq!(
            to_string(&doc),
            r#"<root><a:x xmlns:a="urn:a"/><z><a:y xmlns:a="urn:a" a:attr="v"/></z></root>"#
        );
    }

    #[test]
    fn test_unqualified_child_of_default_namespace() {
        let xml = r#"<root xmlns="urn:d"><child/></root>"#;
        let mut doc = Document::parse(xml).unwrap();
        let root = doc.document_element().unwrap();
        let plain = doc.create_element("", None, "plain");
        doc.append_child(root, plain).unwrap();
        assert_eq!(
            to_string(&doc),
            r#"<root xmlns="urn:d"><child/><plain xmlns=""/></root>"#
        );
    }

    #[test]
    fn test_node_to_string_declares_inherited_bindings() {
        let xml = format!(
            r#"<soap:Envelope xmlns:soap="{}"><soap:Body><soap:Fault/></soap:Body></soap:Envelope>"#,
            ns::SOAP
        );
        let doc = Document::parse(&xml).unwrap();
        let env = doc.document_element().unwrap();
        let body = doc.first_child_element(env).unwrap();
        let fault = doc.first_child_element(body).unwrap();
        assert_eq!(
            node_to_string(&doc, fault),
            format!(r#"<soap:Fault xmlns:soap="{}"/>"#, ns::SOAP)
        );
    }
}
