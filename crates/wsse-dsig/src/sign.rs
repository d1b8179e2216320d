#![forbid(unsafe_code)]

//! XML-DSig signature creation.
//!
//! The `Signature` element must already be in place with its `SignedInfo`
//! filled out; digests and the signature value are written into it.

use crate::context::DsigContext;
use crate::signed_info::SignedInfo;
use crate::encode_base64;
use wsse_core::{ns, Error};
use wsse_crypto::{digest, sign as sig_alg};
use wsse_xml::{Document, NodeId};

/// Compute every reference digest, then sign the canonical `SignedInfo`
/// with the first RSA private key of the context.
pub fn sign(ctx: &DsigContext, doc: &mut Document, signature: NodeId) -> Result<(), Error> {
    let signed_info = SignedInfo::read(doc, signature)?;

    for reference in &signed_info.references {
        let octets = reference.octets(doc, signature)?;
        if ctx.debug {
            tracing::trace!(
                uri = %reference.uri,
                data = %String::from_utf8_lossy(&octets),
                "pre-digest"
            );
        }
        let value = digest::digest(&reference.digest_method, &octets)?;
        doc.set_text(reference.digest_value, &encode_base64(&value));
    }

    let c14n = signed_info.canonicalize(doc)?;
    if ctx.debug {
        tracing::trace!(data = %String::from_utf8_lossy(&c14n), "pre-signature");
    }

    let key = ctx
        .keys_manager
        .find_rsa_private()
        .ok_or_else(|| Error::KeyNotFound("no RSA private key for signing".into()))?;
    let signing_key = key
        .to_signing_key()
        .ok_or_else(|| Error::Key("no signing key".into()))?;
    let algorithm = sig_alg::from_uri(&signed_info.signature_method)?;
    let value = algorithm.sign(&signing_key, &c14n)?;

    let value_node = doc
        .find_child(signature, ns::DSIG, ns::node::SIGNATURE_VALUE)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
    doc.set_text(value_node, &encode_base64(&value));

    tracing::debug!(
        references = signed_info.references.len(),
        algorithm = algorithm.uri(),
        "signature computed"
    );
    Ok(())
}
