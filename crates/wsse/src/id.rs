#![forbid(unsafe_code)]

//! Identifiers for nodes referenced by URI fragment.

use wsse_core::ns;
use wsse_xml::{Document, NodeId};

/// Prefix of every identifier this crate assigns.
pub const ID_PREFIX: &str = "id-";

/// Make `wsu:Id` an identifier attribute of `doc`, so `#id` references to
/// it resolve.
pub fn register_id_attrs(doc: &mut Document) {
    doc.add_id_attr(ns::WSU, ns::attr::ID);
}

/// Return the `wsu:Id` of `node`, assigning `id-<uuid>` first if it has
/// none.
pub fn ensure_id(doc: &mut Document, node: NodeId) -> String {
    if let Some(existing) = doc.attribute_ns(node, ns::WSU, ns::attr::ID) {
        return existing.to_owned();
    }
    register_id_attrs(doc);
    let value = format!("{ID_PREFIX}{}", uuid::Uuid::new_v4());
    doc.set_attribute_ns(node, ns::WSU, ns::prefix::WSU, ns::attr::ID, &value);
    tracing::trace!(id = %value, "assigned identifier");
    value
}

/// `#value`, the same-document URI of an identifier.
pub fn fragment(id: &str) -> String {
    format!("#{id}")
}
