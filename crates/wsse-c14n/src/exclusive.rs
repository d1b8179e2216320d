#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//!
//! Only "visibly utilized" namespace declarations are output. A prefix is
//! visibly utilized when the element's tag name or one of its attributes
//! uses it, or when it appears in the InclusiveNamespaces PrefixList.

use crate::render::NsDecl;
use crate::walk::{NamespacePolicy, Walker};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use wsse_core::Error;
use wsse_xml::{Document, NodeId, NodeSet};

/// Canonicalize using Exclusive C14N 1.0.
pub fn canonicalize(
    doc: &Document,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let walker = Walker {
        doc,
        with_comments,
        node_set,
        policy: Exclusive {
            inclusive_prefixes: inclusive_prefixes.iter().cloned().collect(),
        },
    };
    Ok(walker.run())
}

struct Exclusive {
    inclusive_prefixes: HashSet<String>,
}

impl NamespacePolicy for Exclusive {
    fn declarations(
        &self,
        doc: &Document,
        id: NodeId,
        scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
    ) -> Vec<NsDecl> {
        let Some(elem) = doc.element(id) else {
            return Vec::new();
        };

        let mut utilized = BTreeSet::new();
        utilized.insert(elem.prefix.clone().unwrap_or_default());
        for attr in &elem.attributes {
            if attr.name.namespace.is_none() {
                continue;
            }
            if let Some(prefix) = attr.prefix.as_deref() {
                if !prefix.is_empty() && prefix != "xml" {
                    utilized.insert(prefix.to_owned());
                }
            }
        }
        for prefix in &self.inclusive_prefixes {
            if prefix == "#default" {
                utilized.insert(String::new());
            } else {
                utilized.insert(prefix.clone());
            }
        }

        let mut decls = Vec::new();
        for prefix in utilized {
            if prefix == "xml" {
                continue;
            }
            match scope.get(&prefix) {
                Some(uri) => {
                    if rendered.get(&prefix) != Some(uri) {
                        decls.push(NsDecl::new(&prefix, uri));
                    }
                }
                None if prefix.is_empty() => {
                    // Undeclare a default namespace an output ancestor rendered.
                    if rendered.get("").is_some_and(|u| !u.is_empty()) {
                        decls.push(NsDecl::new("", ""));
                    }
                }
                None => {}
            }
        }
        decls
    }

    fn inherits_xml_attrs(&self) -> bool {
        false
    }
}
