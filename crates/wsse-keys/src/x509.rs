#![forbid(unsafe_code)]

//! X.509 certificate access: issuer/subject names, serial number and the
//! RSA public key.

use crate::key::{Key, KeyData, KeyUsage};
use der::{Decode, Encode, Tag, Tagged};
use spki::DecodePublicKey;
use wsse_core::Error;
use x509_cert::name::Name;

/// A parsed certificate together with its DER encoding.
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    inner: x509_cert::Certificate,
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject_name())
            .field("serial", &self.serial_number())
            .finish()
    }
}

impl Certificate {
    pub fn from_der(data: &[u8]) -> Result<Self, Error> {
        let inner = x509_cert::Certificate::from_der(data)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        Ok(Self {
            der: data.to_vec(),
            inner,
        })
    }

    /// Parse a PEM `CERTIFICATE` block.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, Error> {
        let pem_str = std::str::from_utf8(pem_data)
            .map_err(|e| Error::Certificate(format!("invalid PEM encoding: {e}")))?;
        let (label, der_bytes) = pem_rfc7468::decode_vec(pem_str.trim().as_bytes())
            .map_err(|e| Error::Certificate(format!("failed to decode certificate PEM: {e}")))?;
        if label != "CERTIFICATE" {
            return Err(Error::Certificate(format!(
                "expected CERTIFICATE PEM label, got: {label}"
            )));
        }
        Self::from_der(&der_bytes)
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Issuer distinguished name in RFC 2253 form, most specific RDN first.
    pub fn issuer_name(&self) -> String {
        rfc2253(&self.inner.tbs_certificate.issuer)
    }

    /// Subject distinguished name in RFC 2253 form.
    pub fn subject_name(&self) -> String {
        rfc2253(&self.inner.tbs_certificate.subject)
    }

    /// Serial number as a decimal string.
    pub fn serial_number(&self) -> String {
        rsa::BigUint::from_bytes_be(self.inner.tbs_certificate.serial_number.as_bytes())
            .to_string()
    }

    /// The subject's RSA public key.
    pub fn public_key(&self) -> Result<rsa::RsaPublicKey, Error> {
        let spki_der = self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;
        rsa::RsaPublicKey::from_public_key_der(&spki_der)
            .map_err(|e| Error::Certificate(format!("certificate key is not RSA: {e}")))
    }

    /// A verification key carrying this certificate as its chain.
    pub fn to_key(&self) -> Result<Key, Error> {
        let key = Key::new(
            KeyData::Rsa {
                private: None,
                public: self.public_key()?,
            },
            KeyUsage::Verify,
        );
        Ok(key.with_certificate(self.der.clone()))
    }
}

fn attribute_short_name(oid: &str) -> Option<&'static str> {
    Some(match oid {
        "2.5.4.3" => "CN",
        "2.5.4.4" => "SN",
        "2.5.4.5" => "serialNumber",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.9" => "STREET",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "2.5.4.12" => "title",
        "2.5.4.42" => "GN",
        "0.9.2342.19200300.100.1.1" => "UID",
        "0.9.2342.19200300.100.1.25" => "DC",
        "1.2.840.113549.1.9.1" => "emailAddress",
        _ => return None,
    })
}

fn attribute_string(value: &der::Any) -> Option<String> {
    let bytes = value.value();
    match value.tag() {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::TeletexString
        | Tag::VisibleString => Some(String::from_utf8_lossy(bytes).into_owned()),
        Tag::BmpString => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        _ => None,
    }
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, ch) in value.chars().enumerate() {
        let special = matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && (ch == '#' || ch == ' '))
            || (i == last && ch == ' ');
        if special {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Render a name per RFC 2253: RDNs in reverse order joined by `,`,
/// multi-valued RDNs joined by `+`.
fn rfc2253(name: &Name) -> String {
    name.0
        .iter()
        .rev()
        .map(|rdn| {
            rdn.0
                .iter()
                .map(|atv| {
                    let oid = atv.oid.to_string();
                    match (attribute_short_name(&oid), attribute_string(&atv.value)) {
                        (Some(short), Some(value)) => format!("{short}={}", escape_value(&value)),
                        _ => {
                            let der = atv.value.to_der().unwrap_or_default();
                            format!("{oid}=#{}", hex(&der))
                        }
                    }
                })
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_PEM: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../test-data/keys/cert.pem");
    const CERT_DER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../test-data/keys/cert.der");
    const THEIR_CERT: &str =
        concat!(env!("CARGO_MANIFEST_DIR"), "/../../test-data/keys/their_cert.pem");

    #[test]
    fn test_issuer_name_rfc2253_order() {
        let cert = Certificate::from_pem(&std::fs::read(CERT_PEM).unwrap()).unwrap();
        assert_eq!(
            cert.issuer_name(),
            "CN=example.com,OU=Little Dead Man Island,O=Green Herons,L=La Conner,ST=Washington,C=US"
        );
        assert_eq!(cert.subject_name(), cert.issuer_name());
        assert_eq!(cert.serial_number(), "1000");
    }

    #[test]
    fn test_pem_and_der_agree() {
        let pem = Certificate::from_pem(&std::fs::read(CERT_PEM).unwrap()).unwrap();
        let der = Certificate::from_der(&std::fs::read(CERT_DER).unwrap()).unwrap();
        assert_eq!(pem.der(), der.der());
    }

    #[test]
    fn test_other_party_certificate() {
        let cert = Certificate::from_pem(&std::fs::read(THEIR_CERT).unwrap()).unwrap();
        assert_eq!(cert.serial_number(), "4660");
        assert!(cert.subject_name().starts_with("CN=dev.example.com,OU=Development"));
        let key = cert.to_key().unwrap();
        assert!(key.rsa_private_key().is_none());
        assert_eq!(key.certificate(), Some(cert.der()));
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("Acme, Inc."), "Acme\\, Inc.");
        assert_eq!(escape_value("#1 "), "\\#1\\ ");
    }

    #[test]
    fn test_wrong_pem_label() {
        let pem = "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n";
        assert!(matches!(
            Certificate::from_pem(pem.as_bytes()),
            Err(Error::Certificate(_))
        ));
    }
}
