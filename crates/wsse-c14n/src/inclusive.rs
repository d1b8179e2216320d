#![forbid(unsafe_code)]

//! Canonical XML 1.0 (inclusive C14N).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//!
//! Every in-scope namespace binding not already rendered by the nearest
//! output ancestor is emitted. For document subsets, `xml:*` attributes
//! of omitted ancestors are inherited by the apex elements.

use crate::render::NsDecl;
use crate::walk::{NamespacePolicy, Walker};
use std::collections::BTreeMap;
use wsse_core::Error;
use wsse_xml::{Document, NodeId, NodeSet};

/// Canonicalize using inclusive C14N 1.0.
pub fn canonicalize(
    doc: &Document,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let walker = Walker {
        doc,
        with_comments,
        node_set,
        policy: Inclusive,
    };
    Ok(walker.run())
}

struct Inclusive;

impl NamespacePolicy for Inclusive {
    fn declarations(
        &self,
        _doc: &Document,
        _id: NodeId,
        scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
    ) -> Vec<NsDecl> {
        let mut decls: Vec<NsDecl> = scope
            .iter()
            .filter(|(prefix, uri)| prefix.as_str() != "xml" && rendered.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl::new(prefix, uri))
            .collect();
        if !scope.contains_key("") && rendered.get("").is_some_and(|u| !u.is_empty()) {
            decls.push(NsDecl::new("", ""));
        }
        decls
    }

    fn inherits_xml_attrs(&self) -> bool {
        true
    }
}
