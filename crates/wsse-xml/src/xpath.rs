#![forbid(unsafe_code)]

//! Same-document URI references.
//!
//! Only the forms WS-Security messages use:
//! - `#id-value`
//! - `#xpointer(id('id-value'))`

use crate::document::{Document, NodeId};
use wsse_core::Error;

/// Parse a same-document reference (e.g., `#foo` → `foo`).
pub fn parse_same_document_ref(uri: &str) -> Option<&str> {
    let fragment = uri.strip_prefix('#')?;
    Some(parse_xpointer_id(fragment).unwrap_or(fragment))
}

/// Parse an `xpointer(id('...'))` expression and return the ID value.
pub fn parse_xpointer_id(expr: &str) -> Option<&str> {
    let inner = expr.strip_prefix("xpointer(id('")?;
    let inner = inner.strip_suffix("'))")?;
    Some(inner)
}

/// Resolve an ID value to the attached element carrying it.
///
/// Fails unless exactly one element carries the value.
pub fn resolve_id(doc: &Document, id: &str) -> Result<NodeId, Error> {
    match doc.find_all_by_id(id).as_slice() {
        [node] => Ok(*node),
        [] => Err(Error::InvalidUri(format!("ID not found: {id}"))),
        nodes => Err(Error::InvalidUri(format!(
            "ID {id} is carried by {} elements",
            nodes.len()
        ))),
    }
}

/// Resolve a same-document URI (`#id`) to its element.
pub fn resolve_uri(doc: &Document, uri: &str) -> Result<NodeId, Error> {
    let id = parse_same_document_ref(uri)
        .ok_or_else(|| Error::InvalidUri(format!("unsupported URI: {uri}")))?;
    resolve_id(doc, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_refs() {
        assert_eq!(parse_same_document_ref("#id-1"), Some("id-1"));
        assert_eq!(parse_same_document_ref("#xpointer(id('id-2'))"), Some("id-2"));
        assert_eq!(parse_same_document_ref("http://example.com/"), None);
    }

    #[test]
    fn test_resolve_missing_id() {
        let doc = Document::parse(r#"<a Id="x"/>"#).unwrap();
        assert!(resolve_uri(&doc, "#x").is_ok());
        assert!(matches!(resolve_uri(&doc, "#y"), Err(Error::InvalidUri(_))));
    }

    #[test]
    fn test_resolve_duplicate_id() {
        let doc = Document::parse(r#"<r><a Id="x"/><b Id="x"/></r>"#).unwrap();
        assert!(matches!(resolve_uri(&doc, "#x"), Err(Error::InvalidUri(_))));
        assert!(matches!(
            resolve_uri(&doc, "#xpointer(id('x'))"),
            Err(Error::InvalidUri(_))
        ));
    }
}
