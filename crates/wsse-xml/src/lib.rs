#![forbid(unsafe_code)]

//! XML document abstraction for the wsse workspace.
//!
//! Provides a mutable, arena-backed tree ([`Document`]) built from
//! `roxmltree`, a serializer that repairs namespace bindings after nodes
//! have been moved, and the `NodeSet` type used for canonicalization.

pub mod document;
pub mod nodeset;
pub mod writer;
pub mod xpath;

pub use document::{qualify, Attribute, Document, Element, NodeId, NodeKind, QName};
pub use nodeset::NodeSet;

/// Return roxmltree parsing options that allow DTD.
///
/// roxmltree does not expand external entities, so accepting an internal
/// subset is safe.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}
