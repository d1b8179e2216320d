#![forbid(unsafe_code)]

//! Reference transforms: enveloped-signature and canonicalization.

use wsse_c14n::C14nMode;
use wsse_core::{algorithm, ns, Error};
use wsse_xml::{Document, NodeId, NodeSet};

/// Data flowing through a reference's transform chain.
pub enum TransformData {
    /// A subset of the document being signed.
    Xml(NodeSet),
    /// Octets produced by a canonicalization transform.
    Binary(Vec<u8>),
}

impl TransformData {
    /// Final octets to digest; a node set left over is canonicalized with
    /// inclusive C14N.
    pub fn into_binary(self, doc: &Document) -> Result<Vec<u8>, Error> {
        match self {
            Self::Binary(data) => Ok(data),
            Self::Xml(set) => wsse_c14n::canonicalize(doc, C14nMode::Inclusive, Some(&set), &[]),
        }
    }
}

pub trait Transform {
    fn uri(&self) -> &str;
    fn execute(&self, doc: &Document, input: TransformData) -> Result<TransformData, Error>;
}

/// Removes the enclosing `Signature` subtree from the node set.
pub struct EnvelopedSignatureTransform {
    signature: NodeId,
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(&self, doc: &Document, input: TransformData) -> Result<TransformData, Error> {
        match input {
            TransformData::Xml(mut set) => {
                set.subtract_tree(self.signature, doc);
                Ok(TransformData::Xml(set))
            }
            TransformData::Binary(_) => Err(Error::XmlStructure(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}

pub struct C14nTransform {
    mode: C14nMode,
    inclusive_prefixes: Vec<String>,
}

impl C14nTransform {
    pub fn new(mode: C14nMode, inclusive_prefixes: Vec<String>) -> Self {
        Self {
            mode,
            inclusive_prefixes,
        }
    }
}

impl Transform for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute(&self, doc: &Document, input: TransformData) -> Result<TransformData, Error> {
        let bytes = match input {
            TransformData::Xml(mut set) => {
                if !self.mode.with_comments() {
                    set.remove_comments(doc);
                }
                wsse_c14n::canonicalize(doc, self.mode, Some(&set), &self.inclusive_prefixes)?
            }
            TransformData::Binary(data) => {
                let parsed = Document::parse_bytes(&data)?;
                wsse_c14n::canonicalize(&parsed, self.mode, None, &self.inclusive_prefixes)?
            }
        };
        Ok(TransformData::Binary(bytes))
    }
}

/// Build the transform a `<Transform>` element describes.
pub fn from_node(
    doc: &Document,
    transform_node: NodeId,
    signature: NodeId,
) -> Result<Box<dyn Transform>, Error> {
    let uri = doc
        .attribute(transform_node, ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on Transform".into()))?;
    if uri == algorithm::ENVELOPED_SIGNATURE {
        return Ok(Box::new(EnvelopedSignatureTransform { signature }));
    }
    let mode = C14nMode::from_uri(uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("transform: {uri}")))?;
    Ok(Box::new(C14nTransform::new(
        mode,
        read_inclusive_prefixes(doc, transform_node),
    )))
}

/// The `PrefixList` of an `InclusiveNamespaces` child, if any.
pub fn read_inclusive_prefixes(doc: &Document, node: NodeId) -> Vec<String> {
    doc.child_elements(node)
        .find(|c| {
            doc.element(*c)
                .is_some_and(|e| e.name.local == ns::node::INCLUSIVE_NAMESPACES)
        })
        .and_then(|c| doc.attribute(c, ns::attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<root xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><data>x</data><ds:Signature><ds:SignedInfo/></ds:Signature></root>"#;

    #[test]
    fn test_enveloped_then_c14n() {
        let doc = Document::parse(XML).unwrap();
        let root = doc.document_element().unwrap();
        let sig = doc.find_child(root, ns::DSIG, ns::node::SIGNATURE).unwrap();

        let enveloped = EnvelopedSignatureTransform { signature: sig };
        let c14n = C14nTransform::new(C14nMode::Exclusive, Vec::new());
        let data = TransformData::Xml(NodeSet::tree_without_comments(root, &doc));
        let data = enveloped.execute(&doc, data).unwrap();
        let bytes = c14n.execute(&doc, data).unwrap().into_binary(&doc).unwrap();
        assert_eq!(bytes, b"<root><data>x</data></root>");
    }

    #[test]
    fn test_enveloped_rejects_octets() {
        let doc = Document::parse(XML).unwrap();
        let t = EnvelopedSignatureTransform { signature: doc.root() };
        assert!(t.execute(&doc, TransformData::Binary(Vec::new())).is_err());
    }

    #[test]
    fn test_prefix_list() {
        let xml = r#"<Transform xmlns="http://www.w3.org/2000/09/xmldsig#" Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"><ec:InclusiveNamespaces xmlns:ec="http://www.w3.org/2001/10/xml-exc-c14n#" PrefixList="soap wsu"/></Transform>"#;
        let doc = Document::parse(xml).unwrap();
        let node = doc.document_element().unwrap();
        assert_eq!(read_inclusive_prefixes(&doc, node), ["soap", "wsu"]);
        let t = from_node(&doc, node, node).unwrap();
        assert_eq!(t.uri(), algorithm::EXC_C14N);
    }
}
