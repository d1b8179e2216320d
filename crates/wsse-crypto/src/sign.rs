#![forbid(unsafe_code)]

//! RSA PKCS#1 v1.5 signature algorithms.

use signature::{SignatureEncoding, Signer, Verifier};
use wsse_core::{algorithm, Error};

/// Key material for signature operations.
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
}

impl SigningKey {
    fn public_key(&self) -> rsa::RsaPublicKey {
        match self {
            Self::Rsa(pk) => pk.to_public_key(),
            Self::RsaPublic(pk) => pk.clone(),
        }
    }
}

/// A signature algorithm selected by URI.
pub trait SignatureAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    /// `Ok(false)` means the signature is well-formed but does not match.
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    let (uri, hash) = match uri {
        algorithm::RSA_SHA1 => (algorithm::RSA_SHA1, HashType::Sha1),
        algorithm::RSA_SHA224 => (algorithm::RSA_SHA224, HashType::Sha224),
        algorithm::RSA_SHA256 => (algorithm::RSA_SHA256, HashType::Sha256),
        algorithm::RSA_SHA384 => (algorithm::RSA_SHA384, HashType::Sha384),
        algorithm::RSA_SHA512 => (algorithm::RSA_SHA512, HashType::Sha512),
        _ => return Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    };
    Ok(Box::new(RsaPkcs1v15 { uri, hash }))
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

struct RsaPkcs1v15 {
    uri: &'static str,
    hash: HashType,
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let SigningKey::Rsa(private_key) = key else {
            return Err(Error::Key("RSA private key required for signing".into()));
        };
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                sk.try_sign(data)
                    .map(|sig| sig.to_vec())
                    .map_err(|e| Error::Crypto(format!("RSA sign: {e}")))
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha224 => do_sign!(sha2::Sha224),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let public_key = key.public_key();
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key);
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> rsa::RsaPrivateKey {
        let mut rng = rand::thread_rng();
        rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap()
    }

    #[test]
    fn test_rsa_sha1_sign_verify() {
        let key = SigningKey::Rsa(test_key());
        let alg = from_uri(algorithm::RSA_SHA1).unwrap();
        let sig = alg.sign(&key, b"payload").unwrap();
        assert!(alg.verify(&key, b"payload", &sig).unwrap());
        assert!(!alg.verify(&key, b"tampered", &sig).unwrap());
    }

    #[test]
    fn test_public_key_cannot_sign() {
        let public = SigningKey::RsaPublic(test_key().to_public_key());
        let alg = from_uri(algorithm::RSA_SHA256).unwrap();
        assert!(matches!(alg.sign(&public, b"x"), Err(Error::Key(_))));
    }

    #[test]
    fn test_verify_with_public_half() {
        let private = test_key();
        let public = SigningKey::RsaPublic(private.to_public_key());
        let alg = from_uri(algorithm::RSA_SHA256).unwrap();
        let sig = alg.sign(&SigningKey::Rsa(private), b"data").unwrap();
        assert!(alg.verify(&public, b"data", &sig).unwrap());
    }

    #[test]
    fn test_unsupported_signature_algorithm() {
        assert!(from_uri("http://www.w3.org/2000/09/xmldsig#dsa-sha1").is_err());
    }
}
