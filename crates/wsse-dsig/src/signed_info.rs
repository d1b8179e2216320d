#![forbid(unsafe_code)]

//! Reading `SignedInfo` and computing reference octets.

use crate::transform::{self, TransformData};
use wsse_c14n::C14nMode;
use wsse_core::{ns, Error};
use wsse_xml::{xpath, Document, NodeId, NodeSet};

/// One `<Reference>` of a `SignedInfo`.
#[derive(Debug, Clone)]
pub struct Reference {
    pub node: NodeId,
    pub uri: String,
    pub digest_method: String,
    pub digest_value: NodeId,
}

impl Reference {
    fn read(doc: &Document, node: NodeId) -> Result<Self, Error> {
        let digest_method = doc
            .find_child(node, ns::DSIG, ns::node::DIGEST_METHOD)
            .ok_or_else(|| Error::MissingElement("DigestMethod".into()))?;
        let digest_method = doc
            .attribute(digest_method, ns::attr::ALGORITHM)
            .ok_or_else(|| Error::MissingAttribute("Algorithm on DigestMethod".into()))?
            .to_owned();
        let digest_value = doc
            .find_child(node, ns::DSIG, ns::node::DIGEST_VALUE)
            .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;
        Ok(Self {
            node,
            uri: doc.attribute(node, ns::attr::URI).unwrap_or("").to_owned(),
            digest_method,
            digest_value,
        })
    }

    /// Resolve the URI and run the transform chain, yielding the octets
    /// to digest.
    pub fn octets(&self, doc: &Document, signature: NodeId) -> Result<Vec<u8>, Error> {
        let target = if self.uri.is_empty() {
            doc.root()
        } else {
            xpath::resolve_uri(doc, &self.uri)?
        };
        let mut data = TransformData::Xml(NodeSet::tree_without_comments(target, doc));
        if let Some(transforms) = doc.find_child(self.node, ns::DSIG, ns::node::TRANSFORMS) {
            for t in doc.find_children(transforms, ns::DSIG, ns::node::TRANSFORM) {
                data = transform::from_node(doc, t, signature)?.execute(doc, data)?;
            }
        }
        data.into_binary(doc)
    }
}

/// The parsed `SignedInfo` of a `Signature` element.
#[derive(Debug, Clone)]
pub struct SignedInfo {
    pub node: NodeId,
    pub c14n_mode: C14nMode,
    pub inclusive_prefixes: Vec<String>,
    pub signature_method: String,
    pub references: Vec<Reference>,
}

impl SignedInfo {
    pub fn read(doc: &Document, signature: NodeId) -> Result<Self, Error> {
        let node = doc
            .find_child(signature, ns::DSIG, ns::node::SIGNED_INFO)
            .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

        let c14n_method = doc
            .find_child(node, ns::DSIG, ns::node::CANONICALIZATION_METHOD)
            .ok_or_else(|| Error::MissingElement("CanonicalizationMethod".into()))?;
        let c14n_uri = doc
            .attribute(c14n_method, ns::attr::ALGORITHM)
            .ok_or_else(|| Error::MissingAttribute("Algorithm on CanonicalizationMethod".into()))?;
        let c14n_mode = C14nMode::from_uri(c14n_uri)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;

        let sig_method = doc
            .find_child(node, ns::DSIG, ns::node::SIGNATURE_METHOD)
            .ok_or_else(|| Error::MissingElement("SignatureMethod".into()))?;
        let signature_method = doc
            .attribute(sig_method, ns::attr::ALGORITHM)
            .ok_or_else(|| Error::MissingAttribute("Algorithm on SignatureMethod".into()))?
            .to_owned();

        let references = doc
            .find_children(node, ns::DSIG, ns::node::REFERENCE)
            .into_iter()
            .map(|r| Reference::read(doc, r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            node,
            c14n_mode,
            inclusive_prefixes: transform::read_inclusive_prefixes(doc, c14n_method),
            signature_method,
            references,
        })
    }

    /// Canonical octets of `SignedInfo`, the input to the signature.
    pub fn canonicalize(&self, doc: &Document) -> Result<Vec<u8>, Error> {
        wsse_c14n::canonicalize_subtree(doc, self.node, self.c14n_mode, &self.inclusive_prefixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsse_core::algorithm;

    fn signature_xml() -> String {
        format!(
            r##"<root><item Id="i1">v</item><Signature xmlns="{dsig}"><SignedInfo><CanonicalizationMethod Algorithm="{exc}"/><SignatureMethod Algorithm="{rsa}"/><Reference URI="#i1"><Transforms><Transform Algorithm="{exc}"/></Transforms><DigestMethod Algorithm="{sha1}"/><DigestValue/></Reference></SignedInfo><SignatureValue/></Signature></root>"##,
            dsig = ns::DSIG,
            exc = algorithm::EXC_C14N,
            rsa = algorithm::RSA_SHA1,
            sha1 = algorithm::SHA1,
        )
    }

    #[test]
    fn test_read_signed_info() {
        let doc = Document::parse(&signature_xml()).unwrap();
        let root = doc.document_element().unwrap();
        let sig = doc.find_child(root, ns::DSIG, ns::node::SIGNATURE).unwrap();
        let info = SignedInfo::read(&doc, sig).unwrap();
        assert_eq!(info.c14n_mode, C14nMode::Exclusive);
        assert_eq!(info.signature_method, algorithm::RSA_SHA1);
        assert_eq!(info.references.len(), 1);

        let octets = info.references[0].octets(&doc, sig).unwrap();
        assert_eq!(octets, br#"<item Id="i1">v</item>"#);

        let c14n = String::from_utf8(info.canonicalize(&doc).unwrap()).unwrap();
        assert!(c14n.starts_with(&format!(r#"<SignedInfo xmlns="{}">"#, ns::DSIG)));
    }

    #[test]
    fn test_unresolvable_reference() {
        let xml = signature_xml().replace("#i1", "#missing");
        let doc = Document::parse(&xml).unwrap();
        let root = doc.document_element().unwrap();
        let sig = doc.find_child(root, ns::DSIG, ns::node::SIGNATURE).unwrap();
        let info = SignedInfo::read(&doc, sig).unwrap();
        assert!(matches!(
            info.references[0].octets(&doc, sig),
            Err(Error::InvalidUri(_))
        ));
    }
}
