#![forbid(unsafe_code)]

//! Document-order traversal shared by the inclusive and exclusive variants.
//!
//! The variants differ only in which namespace declarations a visible
//! element renders and whether `xml:*` attributes are inherited from
//! ancestors outside the node set.

use crate::render::{self, Attr, NsDecl};
use std::collections::BTreeMap;
use wsse_core::ns;
use wsse_xml::document::apply_declarations;
use wsse_xml::{Document, NodeId, NodeKind, NodeSet};

pub(crate) trait NamespacePolicy {
    /// Declarations a visible element renders, given its in-scope bindings
    /// and the bindings rendered by its nearest output ancestor.
    fn declarations(
        &self,
        doc: &Document,
        id: NodeId,
        scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
    ) -> Vec<NsDecl>;

    fn inherits_xml_attrs(&self) -> bool;
}

pub(crate) struct Walker<'a, P> {
    pub doc: &'a Document,
    pub with_comments: bool,
    pub node_set: Option<&'a NodeSet>,
    pub policy: P,
}

impl<P: NamespacePolicy> Walker<'_, P> {
    pub fn run(&self) -> Vec<u8> {
        let mut output = Vec::new();
        let empty = BTreeMap::new();
        self.process(self.doc.root(), &empty, &empty, &mut output);
        output
    }

    fn is_visible(&self, id: NodeId) -> bool {
        self.node_set.map_or(true, |ns| ns.contains_id(id))
    }

    fn process(
        &self,
        id: NodeId,
        scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
        output: &mut Vec<u8>,
    ) {
        match self.doc.kind(id) {
            NodeKind::Root => {
                for child in self.doc.children(id) {
                    self.process(*child, scope, rendered, output);
                }
            }
            NodeKind::Element(_) => self.process_element(id, scope, rendered, output),
            NodeKind::Text(text) => {
                if self.is_visible(id) {
                    output.extend_from_slice(render::escape_text(text).as_bytes());
                }
            }
            NodeKind::Comment(text) => {
                if self.with_comments && self.is_visible(id) {
                    self.top_level_break_before(id, output);
                    output.extend_from_slice(b"<!--");
                    output.extend_from_slice(text.as_bytes());
                    output.extend_from_slice(b"-->");
                    self.top_level_break_after(id, output);
                }
            }
            NodeKind::ProcessingInstruction { target, data } => {
                if self.is_visible(id) {
                    self.top_level_break_before(id, output);
                    output.extend_from_slice(b"<?");
                    output.extend_from_slice(target.as_bytes());
                    if let Some(value) = data.as_deref().filter(|d| !d.is_empty()) {
                        output.push(b' ');
                        output.extend_from_slice(render::escape_pi(value).as_bytes());
                    }
                    output.extend_from_slice(b"?>");
                    self.top_level_break_after(id, output);
                }
            }
        }
    }

    fn process_element(
        &self,
        id: NodeId,
        scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
        output: &mut Vec<u8>,
    ) {
        let Some(elem) = self.doc.element(id) else {
            return;
        };
        let mut elem_scope = scope.clone();
        apply_declarations(&mut elem_scope, &self.doc.declared_namespaces(id, scope));

        if !self.is_visible(id) {
            for child in self.doc.children(id) {
                self.process(*child, &elem_scope, rendered, output);
            }
            return;
        }

        let mut ns_decls = self.policy.declarations(self.doc, id, &elem_scope, rendered);
        ns_decls.sort();

        let mut attrs: Vec<Attr> = elem
            .attributes
            .iter()
            .map(|a| {
                let qualified_name = match (&a.name.namespace, a.prefix.as_deref()) {
                    (Some(_), Some(p)) if !p.is_empty() => format!("{p}:{}", a.name.local),
                    _ => a.name.local.clone(),
                };
                Attr {
                    ns_uri: a.name.namespace.clone().unwrap_or_default(),
                    local_name: a.name.local.clone(),
                    qualified_name,
                    value: a.value.clone(),
                }
            })
            .collect();
        if self.node_set.is_some() && self.policy.inherits_xml_attrs() {
            let parent_visible = self
                .doc
                .parent(id)
                .is_some_and(|p| self.doc.is_element(p) && self.is_visible(p));
            if !parent_visible {
                self.inherit_xml_attrs(id, &mut attrs);
            }
        }
        attrs.sort();

        let name = elem.qualified_name();
        output.push(b'<');
        output.extend_from_slice(name.as_bytes());
        for decl in &ns_decls {
            output.extend_from_slice(decl.render().as_bytes());
        }
        for attr in &attrs {
            output.extend_from_slice(attr.render().as_bytes());
        }
        output.push(b'>');

        let mut child_rendered = rendered.clone();
        for decl in &ns_decls {
            child_rendered.insert(decl.prefix.clone(), decl.uri.clone());
        }
        for child in self.doc.children(id) {
            self.process(*child, &elem_scope, &child_rendered, output);
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(name.as_bytes());
        output.push(b'>');
    }

    /// Add `xml:*` attributes of ancestors that `id` does not override.
    fn inherit_xml_attrs(&self, id: NodeId, attrs: &mut Vec<Attr>) {
        let mut current = self.doc.parent(id);
        while let Some(ancestor) = current {
            if let Some(elem) = self.doc.element(ancestor) {
                for a in &elem.attributes {
                    if a.name.namespace.as_deref() != Some(ns::XML) {
                        continue;
                    }
                    if attrs
                        .iter()
                        .any(|x| x.ns_uri == ns::XML && x.local_name == a.name.local)
                    {
                        continue;
                    }
                    attrs.push(Attr {
                        ns_uri: ns::XML.to_owned(),
                        local_name: a.name.local.clone(),
                        qualified_name: format!("xml:{}", a.name.local),
                        value: a.value.clone(),
                    });
                }
            }
            current = self.doc.parent(ancestor);
        }
    }

    fn is_top_level(&self, id: NodeId) -> bool {
        self.doc.parent(id) == Some(self.doc.root())
    }

    fn top_level_break_before(&self, id: NodeId, output: &mut Vec<u8>) {
        if !self.is_top_level(id) {
            return;
        }
        let siblings = self.doc.children(self.doc.root());
        let pos = siblings.iter().position(|s| *s == id).unwrap_or(0);
        if siblings[..pos].iter().any(|s| self.doc.is_element(*s)) {
            output.push(b'\n');
        }
    }

    fn top_level_break_after(&self, id: NodeId, output: &mut Vec<u8>) {
        if !self.is_top_level(id) {
            return;
        }
        let siblings = self.doc.children(self.doc.root());
        let pos = siblings.iter().position(|s| *s == id).unwrap_or(0);
        if siblings[pos + 1..].iter().any(|s| self.doc.is_element(*s)) {
            output.push(b'\n');
        }
    }
}
