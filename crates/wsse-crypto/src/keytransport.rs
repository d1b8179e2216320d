#![forbid(unsafe_code)]

//! Key transport: wrapping a symmetric session key under an RSA key.

use wsse_core::{algorithm, Error};

/// A key transport algorithm selected by URI.
pub trait KeyTransportAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn encrypt(&self, public_key: &rsa::RsaPublicKey, key_data: &[u8]) -> Result<Vec<u8>, Error>;
    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, encrypted: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Create a key transport algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn KeyTransportAlgorithm>, Error> {
    from_uri_with_digest(uri, None)
}

/// Create a key transport algorithm, with the OAEP `DigestMethod` if one
/// was given. MGF1 always uses SHA-1 for `rsa-oaep-mgf1p`.
pub fn from_uri_with_digest(
    uri: &str,
    digest_uri: Option<&str>,
) -> Result<Box<dyn KeyTransportAlgorithm>, Error> {
    match uri {
        algorithm::RSA_PKCS1 => Ok(Box::new(RsaPkcs1Transport)),
        algorithm::RSA_OAEP => {
            let digest = match digest_uri {
                None | Some(algorithm::SHA1) => OaepDigest::Sha1,
                Some(algorithm::SHA256) => OaepDigest::Sha256,
                Some(other) => {
                    return Err(Error::UnsupportedAlgorithm(format!("OAEP digest: {other}")))
                }
            };
            Ok(Box::new(RsaOaepTransport { digest }))
        }
        _ => Err(Error::UnsupportedAlgorithm(format!("key transport: {uri}"))),
    }
}

struct RsaPkcs1Transport;

impl KeyTransportAlgorithm for RsaPkcs1Transport {
    fn uri(&self) -> &'static str {
        algorithm::RSA_PKCS1
    }

    fn encrypt(&self, public_key: &rsa::RsaPublicKey, key_data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut rng = rand::thread_rng();
        public_key
            .encrypt(&mut rng, rsa::Pkcs1v15Encrypt, key_data)
            .map_err(|e| Error::Crypto(format!("RSA PKCS#1 encrypt: {e}")))
    }

    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, encrypted: &[u8]) -> Result<Vec<u8>, Error> {
        private_key
            .decrypt(rsa::Pkcs1v15Encrypt, encrypted)
            .map_err(|e| Error::Crypto(format!("RSA PKCS#1 decrypt: {e}")))
    }
}

#[derive(Debug, Clone, Copy)]
enum OaepDigest {
    Sha1,
    Sha256,
}

struct RsaOaepTransport {
    digest: OaepDigest,
}

impl RsaOaepTransport {
    fn padding(&self) -> rsa::Oaep {
        match self.digest {
            OaepDigest::Sha1 => rsa::Oaep::new_with_mgf_hash::<sha1::Sha1, sha1::Sha1>(),
            OaepDigest::Sha256 => rsa::Oaep::new_with_mgf_hash::<sha2::Sha256, sha1::Sha1>(),
        }
    }
}

impl KeyTransportAlgorithm for RsaOaepTransport {
    fn uri(&self) -> &'static str {
        algorithm::RSA_OAEP
    }

    fn encrypt(&self, public_key: &rsa::RsaPublicKey, key_data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut rng = rand::thread_rng();
        public_key
            .encrypt(&mut rng, self.padding(), key_data)
            .map_err(|e| Error::Crypto(format!("RSA-OAEP encrypt: {e}")))
    }

    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, encrypted: &[u8]) -> Result<Vec<u8>, Error> {
        private_key
            .decrypt(self.padding(), encrypted)
            .map_err(|e| Error::Crypto(format!("RSA-OAEP decrypt: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_pair() -> (rsa::RsaPrivateKey, rsa::RsaPublicKey) {
        let mut rng = rand::thread_rng();
        let private = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let public = private.to_public_key();
        (private, public)
    }

    #[test]
    fn test_oaep_round_trip() {
        let (private, public) = key_pair();
        let transport = from_uri(algorithm::RSA_OAEP).unwrap();
        let session = [7u8; 24];
        let wrapped = transport.encrypt(&public, &session).unwrap();
        assert_eq!(wrapped.len(), 128);
        assert_eq!(transport.decrypt(&private, &wrapped).unwrap(), session);
    }

    #[test]
    fn test_oaep_sha256_digest() {
        let (private, public) = key_pair();
        let transport = from_uri_with_digest(algorithm::RSA_OAEP, Some(algorithm::SHA256)).unwrap();
        let wrapped = transport.encrypt(&public, b"0123456789abcdef").unwrap();
        assert_eq!(transport.decrypt(&private, &wrapped).unwrap(), b"0123456789abcdef");

        let sha1 = from_uri(algorithm::RSA_OAEP).unwrap();
        assert!(sha1.decrypt(&private, &wrapped).is_err());
    }

    #[test]
    fn test_pkcs1_round_trip() {
        let (private, public) = key_pair();
        let transport = from_uri(algorithm::RSA_PKCS1).unwrap();
        let wrapped = transport.encrypt(&public, b"session").unwrap();
        assert_eq!(transport.decrypt(&private, &wrapped).unwrap(), b"session");
    }

    #[test]
    fn test_unknown_transport() {
        assert!(from_uri(algorithm::TRIPLEDES_CBC).is_err());
    }
}
