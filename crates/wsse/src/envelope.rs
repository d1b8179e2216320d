#![forbid(unsafe_code)]

//! Locating the parts of a SOAP envelope the orchestrators rewrite.

use crate::error::{Error, Result};
use crate::id::register_id_attrs;
use wsse_core::ns;
use wsse_xml::{writer, Document, NodeId};

/// A parsed SOAP 1.1 envelope.
pub struct Envelope {
    pub doc: Document,
    pub root: NodeId,
}

impl Envelope {
    /// Parse envelope bytes and register `wsu:Id` as an identifier.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut doc = Document::parse_bytes(data).map_err(Error::XmlParse)?;
        register_id_attrs(&mut doc);
        let root = doc
            .document_element()
            .filter(|r| doc.is_named(*r, ns::SOAP, ns::node::ENVELOPE))
            .ok_or_else(|| Error::MissingElement("soap:Envelope".into()))?;
        Ok(Self { doc, root })
    }

    pub fn header(&self) -> Result<NodeId> {
        self.doc
            .find_child(self.root, ns::SOAP, ns::node::HEADER)
            .ok_or_else(|| Error::MissingElement("soap:Header".into()))
    }

    pub fn body(&self) -> Result<NodeId> {
        self.doc
            .find_child(self.root, ns::SOAP, ns::node::BODY)
            .ok_or_else(|| Error::MissingElement("soap:Body".into()))
    }

    /// `Header/wsse:Security`.
    pub fn security(&self) -> Result<NodeId> {
        let header = self.header()?;
        self.doc
            .find_child(header, ns::WSSE, ns::node::SECURITY)
            .ok_or_else(|| Error::MissingElement("wsse:Security".into()))
    }

    /// `Security/wsu:Timestamp`.
    pub fn timestamp(&self) -> Result<NodeId> {
        let security = self.security()?;
        self.doc
            .find_child(security, ns::WSU, ns::node::TIMESTAMP)
            .ok_or_else(|| Error::MissingElement("wsu:Timestamp".into()))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        writer::to_bytes(&self.doc)
    }
}
