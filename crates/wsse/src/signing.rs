#![forbid(unsafe_code)]

//! WS-Security signing and verification.
//!
//! The signature covers the configured envelope parts by `wsu:Id`
//! reference and names the signer's certificate by issuer and serial
//! number inside a `wsse:SecurityTokenReference`. It is placed first in
//! `Security`, ahead of the `Timestamp`.

use crate::config::{SignedPart, SigningConfig};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::id::{ensure_id, fragment};
use crate::material;
use crate::token::create_security_token_reference;
use std::path::Path;
use wsse_core::ns;
use wsse_dsig::{DsigContext, VerifyResult};
use wsse_keys::{Certificate, KeysManager};
use wsse_xml::{Document, NodeId};

/// Sign `envelope` over `Body` and `Timestamp` with RSA-SHA1.
pub fn sign(envelope: &[u8], key_file: &Path, cert_file: &Path) -> Result<Vec<u8>> {
    sign_with(envelope, key_file, cert_file, &SigningConfig::default())
}

pub fn sign_with(
    envelope: &[u8],
    key_file: &Path,
    cert_file: &Path,
    config: &SigningConfig,
) -> Result<Vec<u8>> {
    let key = material::load_private_key(key_file)?;
    let cert = material::load_certificate(cert_file)?;

    let mut env = Envelope::parse(envelope)?;
    let security = env.security()?;
    let targets = config
        .parts
        .iter()
        .map(|part| locate_part(&env, part))
        .collect::<Result<Vec<_>>>()?;
    let uris: Vec<String> = targets
        .into_iter()
        .map(|node| fragment(&ensure_id(&mut env.doc, node)))
        .collect();

    let signature = build_signature(&mut env.doc, config, &uris, &cert).map_err(Error::SigningFailed)?;
    env.doc
        .insert_child(security, 0, signature)
        .map_err(Error::SigningFailed)?;

    let mut manager = KeysManager::new();
    manager.add_key(key.with_certificate(cert.der().to_vec()));
    let mut ctx = DsigContext::new(manager);
    ctx.debug = tracing::enabled!(tracing::Level::TRACE);
    wsse_dsig::sign(&ctx, &mut env.doc, signature).map_err(Error::SigningFailed)?;

    tracing::debug!(references = ?uris, issuer = %cert.issuer_name(), "signed envelope");
    Ok(env.to_bytes())
}

/// Verify the signature in `Security` against the key of `cert_file`.
///
/// Certificates carried in the message are never used as the verification
/// key.
///
/// Anything that goes wrong after the certificate is loaded, including an
/// envelope that does not parse, is a
/// [`SignatureVerificationFailed`](Error::SignatureVerificationFailed).
pub fn verify(envelope: &[u8], cert_file: &Path) -> Result<()> {
    let (cert, key) = material::load_certificate_key(cert_file)?;
    let rejected = |e: Error| Error::SignatureVerificationFailed(e.to_string());

    let env = Envelope::parse(envelope).map_err(rejected)?;
    let security = env.security().map_err(rejected)?;
    let signature = env
        .doc
        .find_child(security, ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| Error::SignatureVerificationFailed("no Signature in Security".into()))?;
    check_issuer_serial(&env.doc, signature, &cert);

    let mut manager = KeysManager::new();
    manager.add_key(key);
    let mut ctx = DsigContext::new(manager);
    ctx.debug = tracing::enabled!(tracing::Level::TRACE);
    ctx.trusted_keys_only = true;
    match wsse_dsig::verify(&ctx, &env.doc, signature) {
        Ok(VerifyResult::Valid) => {
            tracing::debug!("signature valid");
            Ok(())
        }
        Ok(VerifyResult::Invalid { reason }) => Err(Error::SignatureVerificationFailed(reason)),
        Err(e) => Err(Error::SignatureVerificationFailed(e.to_string())),
    }
}

fn locate_part(env: &Envelope, part: &SignedPart) -> Result<NodeId> {
    match part {
        SignedPart::Body => env.body(),
        SignedPart::Timestamp => env.timestamp(),
        SignedPart::Header {
            namespace,
            local_name,
        } => {
            let header = env.header()?;
            env.doc
                .find_child(header, namespace, local_name)
                .ok_or_else(|| Error::MissingElement(format!("{{{namespace}}}{local_name}")))
        }
    }
}

fn build_signature(
    doc: &mut Document,
    config: &SigningConfig,
    uris: &[String],
    cert: &Certificate,
) -> wsse_core::Result<NodeId> {
    let signature = doc.create_element(ns::DSIG, None, ns::node::SIGNATURE);
    doc.declare_namespace(signature, "", ns::DSIG);

    let signed_info = append(doc, signature, ns::node::SIGNED_INFO)?;
    let c14n = append(doc, signed_info, ns::node::CANONICALIZATION_METHOD)?;
    doc.set_attribute(c14n, ns::attr::ALGORITHM, &config.c14n_method);
    let method = append(doc, signed_info, ns::node::SIGNATURE_METHOD)?;
    doc.set_attribute(method, ns::attr::ALGORITHM, &config.signature_method);

    for uri in uris {
        let reference = append(doc, signed_info, ns::node::REFERENCE)?;
        doc.set_attribute(reference, ns::attr::URI, uri);
        let transforms = append(doc, reference, ns::node::TRANSFORMS)?;
        let transform = append(doc, transforms, ns::node::TRANSFORM)?;
        doc.set_attribute(transform, ns::attr::ALGORITHM, &config.c14n_method);
        let digest = append(doc, reference, ns::node::DIGEST_METHOD)?;
        doc.set_attribute(digest, ns::attr::ALGORITHM, &config.digest_method);
        append(doc, reference, ns::node::DIGEST_VALUE)?;
    }
    append(doc, signature, ns::node::SIGNATURE_VALUE)?;

    let key_info = append(doc, signature, ns::node::KEY_INFO)?;
    let str_node = create_security_token_reference(doc);
    doc.append_child(key_info, str_node)?;
    let x509_data = append(doc, str_node, ns::node::X509_DATA)?;
    let issuer_serial = append(doc, x509_data, ns::node::X509_ISSUER_SERIAL)?;
    let issuer = append(doc, issuer_serial, ns::node::X509_ISSUER_NAME)?;
    doc.set_text(issuer, &cert.issuer_name());
    let serial = append(doc, issuer_serial, ns::node::X509_SERIAL_NUMBER)?;
    doc.set_text(serial, &cert.serial_number());
    if config.embed_certificate {
        let embedded = append(doc, x509_data, ns::node::X509_CERTIFICATE)?;
        doc.set_text(embedded, &wsse_dsig::encode_base64(cert.der()));
    }
    Ok(signature)
}

/// Append an unprefixed DSig element.
fn append(doc: &mut Document, parent: NodeId, local: &str) -> wsse_core::Result<NodeId> {
    let node = doc.create_element(ns::DSIG, None, local);
    doc.append_child(parent, node)?;
    Ok(node)
}

fn check_issuer_serial(doc: &Document, signature: NodeId, cert: &Certificate) {
    let Some(issuer_serial) = doc.find_descendant(signature, ns::DSIG, ns::node::X509_ISSUER_SERIAL) else {
        return;
    };
    let text = |local: &str| {
        doc.find_child(issuer_serial, ns::DSIG, local)
            .map(|n| doc.text(n).trim().to_owned())
            .unwrap_or_default()
    };
    let (issuer, serial) = (text(ns::node::X509_ISSUER_NAME), text(ns::node::X509_SERIAL_NUMBER));
    if issuer != cert.issuer_name() || serial != cert.serial_number() {
        tracing::warn!(
            %issuer,
            %serial,
            expected_issuer = %cert.issuer_name(),
            expected_serial = %cert.serial_number(),
            "signature names a different certificate"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsse_xml::{writer, xpath};

    const ISSUER: &str =
        "CN=example.com,OU=Little Dead Man Island,O=Green Herons,L=La Conner,ST=Washington,C=US";

    fn key_path(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-data/keys").join(name)
    }

    fn fixture() -> Vec<u8> {
        std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/../../test-data/envelope.xml")).unwrap()
    }

    fn signed() -> Vec<u8> {
        sign(&fixture(), &key_path("key.pem"), &key_path("cert.pem")).unwrap()
    }

    #[test]
    fn test_sign_verify_round_trip() {
        verify(&signed(), &key_path("cert.pem")).unwrap();
    }

    #[test]
    fn test_malformed_signature_value() {
        let xml = String::from_utf8(signed()).unwrap();
        assert!(xml.contains("<SignatureValue>"));
        let tampered = xml.replacen("<SignatureValue>", "<SignatureValue>MALFORMED", 1);
        let err = verify(tampered.as_bytes(), &key_path("cert.pem")).unwrap_err();
        assert!(err.is_verification_failure(), "{err:?}");
    }

    #[test]
    fn test_body_tamper_detected() {
        let xml = String::from_utf8(signed()).unwrap();
        let tampered = xml.replacen(">Text<", ">Changed<", 1);
        assert!(matches!(
            verify(tampered.as_bytes(), &key_path("cert.pem")),
            Err(Error::SignatureVerificationFailed(_))
        ));
    }

    #[test]
    fn test_wrong_certificate_rejected() {
        assert!(matches!(
            verify(&signed(), &key_path("their_cert.pem")),
            Err(Error::SignatureVerificationFailed(_))
        ));
    }

    #[test]
    fn test_unsigned_envelope_rejected() {
        assert!(matches!(
            verify(&fixture(), &key_path("cert.pem")),
            Err(Error::SignatureVerificationFailed(_))
        ));
        assert!(matches!(
            verify(b"<soap:Envelope", &key_path("cert.pem")),
            Err(Error::SignatureVerificationFailed(_))
        ));
    }

    #[test]
    fn test_issuer_serial_key_reference() {
        let env = Envelope::parse(&signed()).unwrap();
        let security = env.security().unwrap();
        let signature = env.doc.first_child_element(security).unwrap();
        assert!(env.doc.is_named(signature, ns::DSIG, ns::node::SIGNATURE));

        let issuer = env.doc.find_descendant(signature, ns::DSIG, ns::node::X509_ISSUER_NAME).unwrap();
        assert_eq!(env.doc.text(issuer), ISSUER);
        let serial = env.doc.find_descendant(signature, ns::DSIG, ns::node::X509_SERIAL_NUMBER).unwrap();
        assert_eq!(env.doc.text(serial), "1000");

        let key_info = env.doc.find_child(signature, ns::DSIG, ns::node::KEY_INFO).unwrap();
        let str_node = env.doc.first_child_element(key_info).unwrap();
        assert!(env.doc.is_named(str_node, ns::WSSE, ns::node::SECURITY_TOKEN_REFERENCE));
        assert!(env.doc.find_descendant(signature, ns::DSIG, ns::node::X509_CERTIFICATE).is_none());
    }

    #[test]
    fn test_references_body_and_timestamp() {
        let env = Envelope::parse(&signed()).unwrap();
        let security = env.security().unwrap();
        let signature = env.doc.find_child(security, ns::DSIG, ns::node::SIGNATURE).unwrap();
        let signed_info = env.doc.find_child(signature, ns::DSIG, ns::node::SIGNED_INFO).unwrap();
        let targets: Vec<NodeId> = env
            .doc
            .find_children(signed_info, ns::DSIG, ns::node::REFERENCE)
            .into_iter()
            .map(|r| xpath::resolve_uri(&env.doc, env.doc.attribute(r, ns::attr::URI).unwrap()).unwrap())
            .collect();
        assert_eq!(targets, vec![env.body().unwrap(), env.timestamp().unwrap()]);

        let timestamp_index = env.doc.index_in_parent(env.timestamp().unwrap()).unwrap();
        assert!(env.doc.index_in_parent(signature).unwrap() < timestamp_index);
    }

    #[test]
    fn test_missing_timestamp() {
        let xml = String::from_utf8(fixture()).unwrap();
        let start = xml.find("<wsu:Timestamp>").unwrap();
        let end = xml.find("</wsu:Timestamp>").unwrap() + "</wsu:Timestamp>".len();
        let without = format!("{}{}", &xml[..start], &xml[end..]);
        assert!(matches!(
            sign(without.as_bytes(), &key_path("key.pem"), &key_path("cert.pem")),
            Err(Error::MissingElement(_))
        ));
    }

    #[test]
    fn test_body_only_with_embedded_certificate() {
        let config = SigningConfig {
            parts: vec![SignedPart::Body],
            embed_certificate: true,
            ..SigningConfig::default()
        };
        let signed = sign_with(&fixture(), &key_path("key.pem"), &key_path("cert.pem"), &config).unwrap();
        let env = Envelope::parse(&signed).unwrap();
        let signature = env.doc.find_descendant(env.root, ns::DSIG, ns::node::SIGNATURE).unwrap();
        let signed_info = env.doc.find_child(signature, ns::DSIG, ns::node::SIGNED_INFO).unwrap();
        assert_eq!(env.doc.find_children(signed_info, ns::DSIG, ns::node::REFERENCE).len(), 1);
        assert!(env.doc.find_descendant(signature, ns::DSIG, ns::node::X509_CERTIFICATE).is_some());
        verify(&signed, &key_path("cert.pem")).unwrap();
    }

    #[test]
    fn test_embedded_foreign_certificate_rejected() {
        let config = SigningConfig {
            embed_certificate: true,
            ..SigningConfig::default()
        };
        let forged = sign_with(
            &fixture(),
            &key_path("their_key.pem"),
            &key_path("their_cert.pem"),
            &config,
        )
        .unwrap();
        verify(&forged, &key_path("their_cert.pem")).unwrap();
        assert!(matches!(
            verify(&forged, &key_path("cert.pem")),
            Err(Error::SignatureVerificationFailed(_))
        ));
    }

    #[test]
    fn test_duplicate_body_id_rejected() {
        let xml = String::from_utf8(signed()).unwrap();
        let start = xml.find("<soap:Body").unwrap();
        let end = xml.find("</soap:Body>").unwrap() + "</soap:Body>".len();
        let original = &xml[start..end];
        let evil = original.replacen(">Text<", ">Changed<", 1);
        assert_ne!(evil, original);
        let wrapped = format!("{}{evil}{original}{}", &xml[..start], &xml[end..]);

        let env = Envelope::parse(wrapped.as_bytes()).unwrap();
        assert!(writer::node_to_string(&env.doc, env.body().unwrap()).contains("Changed"));
        assert!(matches!(
            verify(wrapped.as_bytes(), &key_path("cert.pem")),
            Err(Error::SignatureVerificationFailed(_))
        ));
    }

    #[test]
    fn test_bad_key_file() {
        assert!(matches!(
            sign(&fixture(), &key_path("missing.pem"), &key_path("cert.pem")),
            Err(Error::KeyMaterial { .. })
        ));
    }
}
