#![forbid(unsafe_code)]

//! NodeSet type for XML canonicalization and transforms.
//!
//! A `NodeSet` is the document subset selected by a signature reference:
//! a subtree, optionally without comments, optionally minus another subtree
//! (the enveloped-signature transform).

use crate::document::{Document, NodeId, NodeKind};
use std::collections::HashSet;

/// A set of document nodes identified by `NodeId`.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<usize>,
}

impl NodeSet {
    /// Create an empty node set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The subtree rooted at `root_id`, comments included.
    pub fn tree(root_id: NodeId, doc: &Document) -> Self {
        let nodes = doc.descendants(root_id).into_iter().map(NodeId::index).collect();
        Self { nodes }
    }

    /// The subtree rooted at `root_id` without comment nodes.
    ///
    /// Same-document `#id` references select this set.
    pub fn tree_without_comments(root_id: NodeId, doc: &Document) -> Self {
        let nodes = doc
            .descendants(root_id)
            .into_iter()
            .filter(|id| !matches!(doc.kind(*id), NodeKind::Comment(_)))
            .map(NodeId::index)
            .collect();
        Self { nodes }
    }

    /// Remove the subtree rooted at `root_id`.
    pub fn subtract_tree(&mut self, root_id: NodeId, doc: &Document) {
        for id in doc.descendants(root_id) {
            self.nodes.remove(&id.index());
        }
    }

    /// Drop all comment nodes.
    pub fn remove_comments(&mut self, doc: &Document) {
        self.nodes
            .retain(|i| !matches!(doc.kind(NodeId::from_index(*i)), NodeKind::Comment(_)));
    }

    pub fn contains_id(&self, id: NodeId) -> bool {
        self.nodes.contains(&id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_without_comments_and_subtract() {
        let doc = Document::parse("<a><!--c--><b><c/></b>t</a>").unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.first_child_element(a).unwrap();

        let all = NodeSet::tree(a, &doc);
        assert_eq!(all.len(), 5);

        let mut set = NodeSet::tree_without_comments(a, &doc);
        assert_eq!(set.len(), 4);
        set.subtract_tree(b, &doc);
        assert_eq!(set.len(), 2);
        assert!(set.contains_id(a));
        assert!(!set.contains_id(b));
    }
}
