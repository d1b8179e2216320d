#![forbid(unsafe_code)]

//! Mutable arena-backed XML document.
//!
//! Every node lives in one `Vec` and is addressed by a [`NodeId`].  Moving a
//! subtree is a detach from its parent followed by an attach somewhere else;
//! detached nodes stay in the arena until the document is dropped, so a
//! `NodeId` never dangles.
//!
//! Identifier attributes (`Id`, `ID`, `id`, plus any qualified name
//! registered with [`Document::add_id_attr`]) are indexed so that
//! same-document `#id` references resolve without walking the tree.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use wsse_core::{ns, Error};

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI, `None` for names in no namespace.
    pub namespace: Option<String>,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.filter(|n| !n.is_empty()).map(str::to_owned),
            local: local.to_owned(),
        }
    }

    /// A name in no namespace.
    pub fn unqualified(local: &str) -> Self {
        Self::new(None, local)
    }

    /// Whether this name has the given namespace (`""` for none) and local part.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref().unwrap_or("") == namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Qualify a local name with a namespace URI.
///
/// An empty namespace yields a name in no namespace.
pub fn qualify(namespace: &str, local: &str) -> QName {
    QName::new(Some(namespace), local)
}

/// An attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    /// Prefix used when serializing a namespaced attribute.
    pub prefix: Option<String>,
    pub value: String,
}

/// Element payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    /// Preferred prefix for the element name (`None` = default namespace).
    pub prefix: Option<String>,
    pub attributes: Vec<Attribute>,
    /// Namespace declarations written on this element, `("", uri)` for the
    /// default namespace.
    pub namespaces: Vec<(String, String)>,
}

impl Element {
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        let namespace = namespace.unwrap_or("");
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local))
            .map(|a| a.value.as_str())
    }

    /// The name as written: `prefix:local` or `local`.
    pub fn qualified_name(&self) -> String {
        match self.prefix.as_deref() {
            Some(p) if !p.is_empty() => format!("{p}:{}", self.name.local),
            _ => self.name.local.clone(),
        }
    }
}

/// The kind of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node; always at index 0.
    Root,
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: Option<String> },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable XML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    ids: HashMap<String, NodeId>,
    id_attrs: Vec<QName>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            ids: HashMap::new(),
            id_attrs: Vec::new(),
        }
    }

    /// Parse a document from a string.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let parsed = roxmltree::Document::parse_with_options(text, crate::parsing_options())
            .map_err(|e| Error::XmlParse(e.to_string()))?;
        let mut doc = Self::new();
        let root = doc.root();
        for child in parsed.root().children() {
            if let Some(id) = doc.build(text, child) {
                doc.link(root, id);
            }
        }
        Ok(doc)
    }

    /// Parse a document from UTF-8 bytes.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?;
        Self::parse(text)
    }

    /// Parse `xml` as content of `context` and add the resulting nodes to
    /// the arena, detached.
    ///
    /// The fragment may use any prefix that is in scope at `context`.
    pub fn import_fragment(&mut self, xml: &str, context: NodeId) -> Result<Vec<NodeId>, Error> {
        let scope = self.in_scope_namespaces(context);
        let mut wrapped = String::from("<fragment");
        for (prefix, uri) in &scope {
            let uri = uri.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;");
            if prefix.is_empty() {
                wrapped.push_str(&format!(" xmlns=\"{uri}\""));
            } else {
                wrapped.push_str(&format!(" xmlns:{prefix}=\"{uri}\""));
            }
        }
        wrapped.push('>');
        wrapped.push_str(xml);
        wrapped.push_str("</fragment>");

        let parsed = roxmltree::Document::parse_with_options(&wrapped, crate::parsing_options())
            .map_err(|e| Error::XmlParse(format!("decrypted content: {e}")))?;
        let wrapper = parsed.root_element();
        let mut imported = Vec::new();
        for child in wrapper.children() {
            if let Some(id) = self.build(&wrapped, child) {
                imported.push(id);
            }
        }
        Ok(imported)
    }

    fn build(&mut self, source: &str, node: roxmltree::Node<'_, '_>) -> Option<NodeId> {
        let kind = match node.node_type() {
            roxmltree::NodeType::Element => NodeKind::Element(element_from_source(source, node)),
            roxmltree::NodeType::Text => NodeKind::Text(node.text().unwrap_or("").to_owned()),
            roxmltree::NodeType::Comment => NodeKind::Comment(node.text().unwrap_or("").to_owned()),
            roxmltree::NodeType::PI => {
                let pi = node.pi()?;
                NodeKind::ProcessingInstruction {
                    target: pi.target.to_owned(),
                    data: pi.value.map(str::to_owned),
                }
            }
            roxmltree::NodeType::Root => return None,
        };
        let id = self.push(kind);
        for child in node.children() {
            if let Some(child_id) = self.build(source, child) {
                self.link(id, child_id);
            }
        }
        self.register_ids(id);
        Some(id)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    // ── Navigation ───────────────────────────────────────────────────

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The top-level element, if the document has one.
    pub fn document_element(&self) -> Option<NodeId> {
        self.child_elements(self.root()).next()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Whether `id` is an element with the given namespace and local name.
    pub fn is_named(&self, id: NodeId, namespace: &str, local: &str) -> bool {
        self.element(id).is_some_and(|e| e.name.is(namespace, local))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |c| self.is_element(*c))
    }

    pub fn first_child_element(&self, id: NodeId) -> Option<NodeId> {
        self.child_elements(id).next()
    }

    /// First child element with the given namespace and local name.
    pub fn find_child(&self, id: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.child_elements(id)
            .find(|c| self.is_named(*c, namespace, local))
    }

    /// All child elements with the given namespace and local name.
    pub fn find_children(&self, id: NodeId, namespace: &str, local: &str) -> Vec<NodeId> {
        self.child_elements(id)
            .filter(|c| self.is_named(*c, namespace, local))
            .collect()
    }

    /// `id` and all its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for child in self.nodes[n.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// First element in the subtree of `id` (inclusive) with the given name.
    pub fn find_descendant(&self, id: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|n| self.is_named(*n, namespace, local))
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_ancestor_or_self(self.root(), id)
    }

    // ── Attributes and text ──────────────────────────────────────────

    /// Value of an attribute in no namespace.
    pub fn attribute(&self, id: NodeId, local: &str) -> Option<&str> {
        self.element(id)?.attribute(None, local)
    }

    /// Value of a namespaced attribute.
    pub fn attribute_ns(&self, id: NodeId, namespace: &str, local: &str) -> Option<&str> {
        self.element(id)?.attribute(Some(namespace), local)
    }

    /// Set an attribute in no namespace.
    pub fn set_attribute(&mut self, id: NodeId, local: &str, value: &str) {
        self.put_attribute(id, QName::unqualified(local), None, value);
    }

    /// Set a namespaced attribute, written with `prefix`.
    pub fn set_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        prefix: &str,
        local: &str,
        value: &str,
    ) {
        let prefix = if namespace == ns::XML { "xml" } else { prefix };
        self.put_attribute(id, qualify(namespace, local), Some(prefix.to_owned()), value);
    }

    fn put_attribute(&mut self, id: NodeId, name: QName, prefix: Option<String>, value: &str) {
        let Some(elem) = self.element_mut(id) else {
            return;
        };
        if let Some(existing) = elem.attributes.iter_mut().find(|a| a.name == name) {
            existing.value = value.to_owned();
        } else {
            elem.attributes.push(Attribute {
                name,
                prefix,
                value: value.to_owned(),
            });
        }
        self.register_ids(id);
    }

    /// Concatenated text of the direct text children of `id`.
    pub fn text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|c| match self.kind(*c) {
                NodeKind::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        let node = self.create_text(text);
        self.link(id, node);
    }

    // ── Construction ─────────────────────────────────────────────────

    /// Create a detached element.
    ///
    /// `prefix` is the preferred prefix; the serializer declares it where
    /// the element ends up if the binding is not already in scope.
    pub fn create_element(&mut self, namespace: &str, prefix: Option<&str>, local: &str) -> NodeId {
        let prefix = prefix.filter(|p| !p.is_empty() && !namespace.is_empty());
        self.push(NodeKind::Element(Element {
            name: qualify(namespace, local),
            prefix: prefix.map(str::to_owned),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_owned()))
    }

    /// Declare a namespace binding on an element.
    pub fn declare_namespace(&mut self, id: NodeId, prefix: &str, uri: &str) {
        if let Some(elem) = self.element_mut(id) {
            if let Some(decl) = elem.namespaces.iter_mut().find(|(p, _)| p == prefix) {
                decl.1 = uri.to_owned();
            } else {
                elem.namespaces.push((prefix.to_owned(), uri.to_owned()));
            }
        }
    }

    /// Copy the subtree rooted at `id`; the copy is detached.
    ///
    /// Identifiers inside the copy are not indexed, so `find_by_id` keeps
    /// resolving to the original while it stays attached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let copy = self.push(kind);
        for child in self.children(id).to_vec() {
            let child_copy = self.deep_clone(child);
            self.link(copy, child_copy);
        }
        copy
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Remove `id` from its parent.  The subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Move `child` to position `index` among `parent`'s children.
    ///
    /// `index` is interpreted after `child` has been detached, and clamped
    /// to the number of children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), Error> {
        if !matches!(self.kind(parent), NodeKind::Root | NodeKind::Element(_)) {
            return Err(Error::XmlStructure("only elements can have children".into()));
        }
        if child == self.root() || self.is_ancestor_or_self(child, parent) {
            return Err(Error::XmlStructure(
                "cannot move a node into its own subtree".into(),
            ));
        }
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Move `child` so it directly precedes `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) -> Result<(), Error> {
        let parent = self
            .parent(sibling)
            .ok_or_else(|| Error::XmlStructure("reference node has no parent".into()))?;
        self.detach(child);
        let index = self
            .index_in_parent(sibling)
            .ok_or_else(|| Error::XmlStructure("reference node has no parent".into()))?;
        self.insert_child(parent, index, child)
    }

    /// Put `replacement` where `old` is, detaching `old`.
    pub fn replace(&mut self, old: NodeId, replacement: &[NodeId]) -> Result<(), Error> {
        let parent = self
            .parent(old)
            .ok_or_else(|| Error::XmlStructure("cannot replace a detached node".into()))?;
        let index = self
            .index_in_parent(old)
            .ok_or_else(|| Error::XmlStructure("cannot replace a detached node".into()))?;
        self.detach(old);
        for (offset, node) in replacement.iter().enumerate() {
            self.insert_child(parent, index + offset, *node)?;
        }
        Ok(())
    }

    // ── Identifiers ──────────────────────────────────────────────────

    /// Register an additional identifier attribute (e.g. `wsu:Id`) and
    /// index every element already carrying it.
    pub fn add_id_attr(&mut self, namespace: &str, local: &str) {
        let name = qualify(namespace, local);
        if self.id_attrs.contains(&name) {
            return;
        }
        self.id_attrs.push(name);
        for id in self.descendants(self.root()) {
            self.register_ids(id);
        }
    }

    fn is_id_attr(&self, name: &QName) -> bool {
        match &name.namespace {
            None => matches!(name.local.as_str(), "Id" | "ID" | "id"),
            Some(_) => self.id_attrs.contains(name),
        }
    }

    fn register_ids(&mut self, id: NodeId) {
        let values: Vec<String> = match self.element(id) {
            Some(elem) => elem
                .attributes
                .iter()
                .filter(|a| self.is_id_attr(&a.name))
                .map(|a| a.value.clone())
                .collect(),
            None => return,
        };
        for value in values {
            self.ids.insert(value, id);
        }
    }

    fn carries_id(&self, id: NodeId, value: &str) -> bool {
        self.element(id).is_some_and(|elem| {
            elem.attributes
                .iter()
                .any(|a| a.value == value && self.is_id_attr(&a.name))
        })
    }

    /// Find the attached element whose identifier attribute equals `value`.
    pub fn find_by_id(&self, value: &str) -> Option<NodeId> {
        if let Some(&id) = self.ids.get(value) {
            if self.is_attached(id) && self.carries_id(id, value) {
                return Some(id);
            }
        }
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.carries_id(*n, value))
    }

    /// Every attached element whose identifier attribute equals `value`,
    /// in document order.
    pub fn find_all_by_id(&self, value: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|n| self.carries_id(*n, value))
            .collect()
    }

    // ── Namespaces ───────────────────────────────────────────────────

    /// Namespace bindings in effect at `id`, as the serializer writes them.
    pub fn in_scope_namespaces(&self, id: NodeId) -> BTreeMap<String, String> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            path.push(n);
            current = self.parent(n);
        }
        let mut scope = BTreeMap::new();
        for n in path.into_iter().rev() {
            let decls = self.declared_namespaces(n, &scope);
            apply_declarations(&mut scope, &decls);
        }
        scope
    }

    /// Declarations `id` needs on top of `parent_scope`: its explicit
    /// declarations plus any binding its own name or attributes require
    /// but the scope lacks or binds differently.
    pub fn declared_namespaces(
        &self,
        id: NodeId,
        parent_scope: &BTreeMap<String, String>,
    ) -> Vec<(String, String)> {
        let Some(elem) = self.element(id) else {
            return Vec::new();
        };
        let mut decls: Vec<(String, String)> = elem
            .namespaces
            .iter()
            .filter(|(p, u)| p.is_empty() || !u.is_empty())
            .cloned()
            .collect();
        let mut scope = parent_scope.clone();
        apply_declarations(&mut scope, &decls);

        let prefix = elem.prefix.as_deref().unwrap_or("");
        let uri = elem.name.namespace.as_deref().unwrap_or("");
        if prefix.is_empty() || !uri.is_empty() {
            bind(&mut decls, &mut scope, prefix, uri);
        }
        for attr in &elem.attributes {
            if let (Some(uri), Some(prefix)) = (&attr.name.namespace, &attr.prefix) {
                if uri != ns::XML && !prefix.is_empty() {
                    bind(&mut decls, &mut scope, prefix, uri);
                }
            }
        }
        decls
    }
}

/// Apply namespace declarations to a scope; an empty URI undeclares.
pub fn apply_declarations(scope: &mut BTreeMap<String, String>, decls: &[(String, String)]) {
    for (prefix, uri) in decls {
        if uri.is_empty() {
            scope.remove(prefix);
        } else {
            scope.insert(prefix.clone(), uri.clone());
        }
    }
}

fn bind(
    decls: &mut Vec<(String, String)>,
    scope: &mut BTreeMap<String, String>,
    prefix: &str,
    uri: &str,
) {
    let current = scope.get(prefix).map(String::as_str).unwrap_or("");
    if current == uri {
        return;
    }
    if let Some(decl) = decls.iter_mut().find(|(p, _)| p == prefix) {
        decl.1 = uri.to_owned();
    } else {
        decls.push((prefix.to_owned(), uri.to_owned()));
    }
    apply_declarations(scope, &[(prefix.to_owned(), uri.to_owned())]);
}

fn element_from_source(source: &str, node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let inherited: Vec<(Option<String>, String)> = node
        .parent_element()
        .map(|p| {
            p.namespaces()
                .map(|n| (n.name().map(str::to_owned), n.uri().to_owned()))
                .collect()
        })
        .unwrap_or_default();
    let namespaces = node
        .namespaces()
        .filter(|n| n.name() != Some("xml"))
        .filter(|n| {
            !inherited
                .iter()
                .any(|(name, uri)| name.as_deref() == n.name() && uri == n.uri())
        })
        .map(|n| (n.name().unwrap_or("").to_owned(), n.uri().to_owned()))
        .collect();

    let attributes = node
        .attributes()
        .map(|a| {
            let prefix = a.namespace().map(|uri| {
                if uri == ns::XML {
                    "xml".to_owned()
                } else {
                    node.namespaces()
                        .find(|n| n.uri() == uri && n.name().is_some())
                        .and_then(|n| n.name())
                        .unwrap_or("")
                        .to_owned()
                }
            });
            Attribute {
                name: QName::new(a.namespace(), a.name()),
                prefix,
                value: a.value().to_owned(),
            }
        })
        .collect();

    Element {
        name: QName::new(tag.namespace(), tag.name()),
        prefix: source_prefix(source, node),
        attributes,
        namespaces,
    }
}

/// Read the prefix of an element's start tag from the source text.
fn source_prefix(source: &str, node: roxmltree::Node<'_, '_>) -> Option<String> {
    let rest = source.get(node.range().start + 1..)?;
    let end = rest.find(|c: char| c.is_whitespace() || c == '>' || c == '/')?;
    rest[..end].split_once(':').map(|(p, _)| p.to_owned())
}
