#![forbid(unsafe_code)]

//! Key types and data structures.

use wsse_crypto::SigningKey;

/// Usage flags for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    Sign,
    Verify,
    Encrypt,
    Decrypt,
    Any,
}

/// The underlying key data.
pub enum KeyData {
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
    /// Raw secret for a block cipher; the algorithm fixes its length.
    Symmetric(Vec<u8>),
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { private: Some(_), .. } => write!(f, "RSA private+public key"),
            Self::Rsa { private: None, .. } => write!(f, "RSA public key"),
            Self::Symmetric(k) => write!(f, "symmetric key ({} bytes)", k.len()),
        }
    }
}

/// A named key with its certificate chain.
#[derive(Debug)]
pub struct Key {
    pub name: Option<String>,
    pub data: KeyData,
    pub usage: KeyUsage,
    /// DER-encoded certificates, leaf first.
    pub x509_chain: Vec<Vec<u8>>,
}

impl Key {
    pub fn new(data: KeyData, usage: KeyUsage) -> Self {
        Self {
            name: None,
            data,
            usage,
            x509_chain: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a DER certificate as the leaf of this key's chain.
    pub fn with_certificate(mut self, der: Vec<u8>) -> Self {
        self.x509_chain.insert(0, der);
        self
    }

    /// Convert to a `SigningKey` for the signature algorithms.
    pub fn to_signing_key(&self) -> Option<SigningKey> {
        match &self.data {
            KeyData::Rsa { private: Some(pk), .. } => Some(SigningKey::Rsa(pk.clone())),
            KeyData::Rsa { public, .. } => Some(SigningKey::RsaPublic(public.clone())),
            _ => None,
        }
    }

    /// Raw symmetric key bytes.
    pub fn symmetric_key_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            KeyData::Symmetric(k) => Some(k),
            KeyData::Rsa { .. } => None,
        }
    }

    pub fn rsa_public_key(&self) -> Option<&rsa::RsaPublicKey> {
        match &self.data {
            KeyData::Rsa { public, .. } => Some(public),
            _ => None,
        }
    }

    pub fn rsa_private_key(&self) -> Option<&rsa::RsaPrivateKey> {
        match &self.data {
            KeyData::Rsa { private: Some(pk), .. } => Some(pk),
            _ => None,
        }
    }

    /// The leaf certificate, if one was attached.
    pub fn certificate(&self) -> Option<&[u8]> {
        self.x509_chain.first().map(Vec::as_slice)
    }
}
