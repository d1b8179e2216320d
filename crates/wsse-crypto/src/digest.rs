#![forbid(unsafe_code)]

//! Digest (hash) algorithms.

use digest::Digest;
use wsse_core::{algorithm, Error};

/// An incremental hash selected by URI.
pub trait DigestAlgorithm: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Vec<u8>;
    fn uri(&self) -> &'static str;
}

/// Create a digest algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
    match uri {
        algorithm::SHA1 => Ok(Hasher::<sha1::Sha1>::boxed(algorithm::SHA1)),
        algorithm::SHA224 => Ok(Hasher::<sha2::Sha224>::boxed(algorithm::SHA224)),
        algorithm::SHA256 => Ok(Hasher::<sha2::Sha256>::boxed(algorithm::SHA256)),
        algorithm::SHA384 => Ok(Hasher::<sha2::Sha384>::boxed(algorithm::SHA384)),
        algorithm::SHA512 => Ok(Hasher::<sha2::Sha512>::boxed(algorithm::SHA512)),
        _ => Err(Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}"))),
    }
}

/// Compute a digest in one shot.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hasher = from_uri(uri)?;
    hasher.update(data);
    Ok(hasher.finalize())
}

struct Hasher<D> {
    inner: D,
    uri: &'static str,
}

impl<D: Digest + Send + 'static> Hasher<D> {
    fn boxed(uri: &'static str) -> Box<dyn DigestAlgorithm> {
        Box::new(Self { inner: D::new(), uri })
    }
}

impl<D: Digest + Send> DigestAlgorithm for Hasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.inner.finalize().to_vec()
    }

    fn uri(&self) -> &'static str {
        self.uri
    }
}
