#![forbid(unsafe_code)]

//! Hooks for a SOAP client's send/receive path.

use crate::config::{EncryptionConfig, SigningConfig};
use crate::error::Result;
use crate::{decryption, encryption, signing};
use std::path::PathBuf;

/// An outgoing envelope and, once the exchange completed, the reply.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub envelope: Vec<u8>,
    pub reply: Option<Vec<u8>>,
}

impl MessageContext {
    pub fn new(envelope: Vec<u8>) -> Self {
        Self {
            envelope,
            reply: None,
        }
    }
}

/// Something that rewrites messages on their way out and back in.
pub trait MessagePlugin {
    fn sending(&self, message: &mut MessageContext) -> Result<()>;
    fn received(&self, message: &mut MessageContext) -> Result<()>;
}

/// Signs then encrypts outgoing envelopes; decrypts then verifies replies.
#[derive(Debug, Clone)]
pub struct WssePlugin {
    /// Our private key.
    pub key_file: PathBuf,
    /// Our certificate, named in signatures.
    pub cert_file: PathBuf,
    /// The peer's certificate: we encrypt for it and verify against it.
    pub their_cert_file: PathBuf,
    pub signing: SigningConfig,
    pub encryption: EncryptionConfig,
}

impl WssePlugin {
    pub fn new(
        key_file: impl Into<PathBuf>,
        cert_file: impl Into<PathBuf>,
        their_cert_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key_file: key_file.into(),
            cert_file: cert_file.into(),
            their_cert_file: their_cert_file.into(),
            signing: SigningConfig::default(),
            encryption: EncryptionConfig::default(),
        }
    }
}

impl MessagePlugin for WssePlugin {
    fn sending(&self, message: &mut MessageContext) -> Result<()> {
        let signed = signing::sign_with(&message.envelope, &self.key_file, &self.cert_file, &self.signing)?;
        message.envelope = encryption::encrypt_with(&signed, &self.their_cert_file, &self.encryption)?;
        Ok(())
    }

    fn received(&self, message: &mut MessageContext) -> Result<()> {
        let Some(reply) = message.reply.as_deref() else {
            return Ok(());
        };
        let decrypted = decryption::decrypt(reply, &self.key_file)?;
        signing::verify(&decrypted, &self.their_cert_file)?;
        message.reply = Some(decrypted);
        Ok(())
    }
}
