#![forbid(unsafe_code)]

//! XML-DSig signature verification.
//!
//! Processing order:
//! 1. Read `SignedInfo`: CanonicalizationMethod, SignatureMethod
//! 2. For each `Reference`: resolve URI, run transforms, compare digest
//! 3. Resolve the verification key from `KeyInfo`, or from the keys
//!    manager alone when the context trusts only its own keys
//! 4. Canonicalize `SignedInfo` and check `SignatureValue`

use crate::context::DsigContext;
use crate::decode_base64;
use crate::keyinfo::resolve_verification_key;
use crate::signed_info::SignedInfo;
use wsse_core::{ns, Error};
use wsse_crypto::{digest, sign as sig_alg};
use wsse_xml::{Document, NodeId};

/// Result of signature verification.
#[derive(Debug, PartialEq, Eq)]
pub enum VerifyResult {
    Valid,
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }
}

/// Verify the `Signature` element `signature` of `doc`.
///
/// Digest or signature mismatches yield `VerifyResult::Invalid`; structural
/// problems (missing elements, unresolvable URIs, undecodable values) are
/// errors.
pub fn verify(ctx: &DsigContext, doc: &Document, signature: NodeId) -> Result<VerifyResult, Error> {
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
        let computed = digest::digest(&reference.digest_method, &octets)?;
        let expected = decode_base64(&doc.text(reference.digest_value), "DigestValue")?;
        if computed != expected {
            return Ok(VerifyResult::Invalid {
                reason: format!("URI={}: digest does not match content", reference.uri),
            });
        }
    }

    let key_info = doc
        .find_child(signature, ns::DSIG, ns::node::KEY_INFO)
        .filter(|_| !ctx.trusted_keys_only);
    let key = resolve_verification_key(doc, key_info, &ctx.keys_manager)?;

    let c14n = signed_info.canonicalize(doc)?;
    if ctx.debug {
        tracing::trace!(data = %String::from_utf8_lossy(&c14n), "pre-signature");
    }

    let value_node = doc
        .find_child(signature, ns::DSIG, ns::node::SIGNATURE_VALUE)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
    let value = decode_base64(&doc.text(value_node), "SignatureValue")?;

    let algorithm = sig_alg::from_uri(&signed_info.signature_method)?;
    if algorithm.verify(&key, &c14n, &value)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: "signature value verification failed".into(),
        })
    }
}
