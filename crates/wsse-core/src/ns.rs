#![forbid(unsafe_code)]

//! XML namespace constants used across the workspace.

/// SOAP 1.1 envelope namespace
pub const SOAP: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML Encryption namespace
pub const ENC: &str = "http://www.w3.org/2001/04/xmlenc#";

/// Exclusive C14N namespace (InclusiveNamespaces element)
pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

/// Common prefix of the OASIS WS-Security 2004/01 schema URIs
pub const WSS_BASE: &str = "http://docs.oasis-open.org/wss/2004/01/";

/// WS-Security extension namespace (`wsse`)
pub const WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Security utility namespace (`wsu`)
pub const WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// XML namespace
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";

// ── Conventional prefixes ────────────────────────────────────────────

pub mod prefix {
    pub const SOAP: &str = "soap";
    pub const DSIG: &str = "ds";
    pub const ENC: &str = "xenc";
    pub const WSSE: &str = "wsse";
    pub const WSU: &str = "wsu";
}

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // SOAP elements
    pub const ENVELOPE: &str = "Envelope";
    pub const HEADER: &str = "Header";
    pub const BODY: &str = "Body";

    // WS-Security elements
    pub const SECURITY: &str = "Security";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const BINARY_SECURITY_TOKEN: &str = "BinarySecurityToken";
    pub const SECURITY_TOKEN_REFERENCE: &str = "SecurityTokenReference";
    pub const WSSE_REFERENCE: &str = "Reference";

    // DSig elements
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "SignatureValue";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";
    pub const REFERENCE: &str = "Reference";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";

    // KeyInfo elements
    pub const KEY_INFO: &str = "KeyInfo";
    pub const KEY_NAME: &str = "KeyName";
    pub const RETRIEVAL_METHOD: &str = "RetrievalMethod";

    // X509 elements
    pub const X509_DATA: &str = "X509Data";
    pub const X509_CERTIFICATE: &str = "X509Certificate";
    pub const X509_ISSUER_SERIAL: &str = "X509IssuerSerial";
    pub const X509_ISSUER_NAME: &str = "X509IssuerName";
    pub const X509_SERIAL_NUMBER: &str = "X509SerialNumber";

    // Encryption elements
    pub const ENCRYPTED_DATA: &str = "EncryptedData";
    pub const ENCRYPTED_KEY: &str = "EncryptedKey";
    pub const ENCRYPTION_METHOD: &str = "EncryptionMethod";
    pub const CIPHER_DATA: &str = "CipherData";
    pub const CIPHER_VALUE: &str = "CipherValue";
    pub const REFERENCE_LIST: &str = "ReferenceList";
    pub const DATA_REFERENCE: &str = "DataReference";

    // Exc C14N
    pub const INCLUSIVE_NAMESPACES: &str = "InclusiveNamespaces";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const ID: &str = "Id";
    pub const URI: &str = "URI";
    pub const TYPE: &str = "Type";
    pub const ALGORITHM: &str = "Algorithm";
    pub const PREFIX_LIST: &str = "PrefixList";
    pub const ENCODING_TYPE: &str = "EncodingType";
    pub const VALUE_TYPE: &str = "ValueType";
    pub const TOKEN_TYPE: &str = "TokenType";
    pub const MUST_UNDERSTAND: &str = "mustUnderstand";
}

// ── WS-Security token URIs ───────────────────────────────────────────

/// `EncodingType` of a base64 binary security token
pub const BASE64B: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// `ValueType` of an X.509v3 binary security token
pub const X509TOKEN: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-x509-token-profile-1.0#X509v3";

// ── Encryption type URIs ─────────────────────────────────────────────

pub const ENC_TYPE_CONTENT: &str = "http://www.w3.org/2001/04/xmlenc#Content";
pub const ENC_TYPE_ELEMENT: &str = "http://www.w3.org/2001/04/xmlenc#Element";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wss_uris_share_base() {
        for uri in [WSSE, WSU, BASE64B, X509TOKEN] {
            assert!(uri.starts_with(WSS_BASE), "{uri}");
        }
    }
}
