#![forbid(unsafe_code)]

//! Block ciphers in CBC mode (AES, 3DES) with XML Encryption padding.
//!
//! Ciphertext is laid out as `IV || blocks`, the layout `CipherValue`
//! carries on the wire.

use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use wsse_core::{algorithm, Error};

/// A block cipher selected by URI.
pub trait CipherAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error>;
    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error>;
    fn key_size(&self) -> usize;
}

/// Create a cipher algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn CipherAlgorithm>, Error> {
    match uri {
        algorithm::AES128_CBC => Ok(Box::new(AesCbc { key_size: 16, uri: algorithm::AES128_CBC })),
        algorithm::AES192_CBC => Ok(Box::new(AesCbc { key_size: 24, uri: algorithm::AES192_CBC })),
        algorithm::AES256_CBC => Ok(Box::new(AesCbc { key_size: 32, uri: algorithm::AES256_CBC })),
        algorithm::TRIPLEDES_CBC => Ok(Box::new(TripleDesCbc)),
        _ => Err(Error::UnsupportedAlgorithm(format!("cipher: {uri}"))),
    }
}

/// Generate a fresh random session key sized for the cipher at `uri`.
pub fn generate_key(uri: &str) -> Result<Vec<u8>, Error> {
    let cipher = from_uri(uri)?;
    let mut key = vec![0u8; cipher.key_size()];
    rand::thread_rng().fill_bytes(&mut key);
    Ok(key)
}

fn check_key(key: &[u8], expected: usize) -> Result<(), Error> {
    if key.len() != expected {
        return Err(Error::Crypto(format!(
            "expected {expected} byte key, got {}",
            key.len()
        )));
    }
    Ok(())
}

fn random_iv<const N: usize>() -> [u8; N] {
    let mut iv = [0u8; N];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

macro_rules! cbc_encrypt {
    ($cipher:ty, $key:expr, $iv:expr, $buf:expr) => {{
        let len = $buf.len();
        cbc::Encryptor::<$cipher>::new_from_slices($key, $iv)
            .map_err(|e| Error::Crypto(format!("CBC init: {e}")))?
            .encrypt_padded_mut::<NoPadding>(&mut $buf, len)
            .map_err(|e| Error::Crypto(format!("CBC encrypt: {e}")))?;
    }};
}

macro_rules! cbc_decrypt {
    ($cipher:ty, $key:expr, $iv:expr, $buf:expr) => {{
        cbc::Decryptor::<$cipher>::new_from_slices($key, $iv)
            .map_err(|e| Error::Crypto(format!("CBC init: {e}")))?
            .decrypt_padded_mut::<NoPadding>(&mut $buf)
            .map_err(|e| Error::Crypto(format!("CBC decrypt: {e}")))?;
    }};
}

// ── AES-CBC ──────────────────────────────────────────────────────────

struct AesCbc {
    key_size: usize,
    uri: &'static str,
}

impl CipherAlgorithm for AesCbc {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn key_size(&self) -> usize {
        self.key_size
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        check_key(key, self.key_size)?;
        let iv = random_iv::<16>();
        let mut buf = pad(plaintext, 16);
        match self.key_size {
            16 => cbc_encrypt!(aes::Aes128, key, &iv, buf),
            24 => cbc_encrypt!(aes::Aes192, key, &iv, buf),
            _ => cbc_encrypt!(aes::Aes256, key, &iv, buf),
        }
        Ok([iv.as_slice(), &buf].concat())
    }

    fn decrypt(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
        check_key(key, self.key_size)?;
        if data.len() < 32 || data.len() % 16 != 0 {
            return Err(Error::Crypto("AES-CBC data invalid length".into()));
        }
        let (iv, ciphertext) = data.split_at(16);
        let mut buf = ciphertext.to_vec();
        match self.key_size {
            16 => cbc_decrypt!(aes::Aes128, key, iv, buf),
            24 => cbc_decrypt!(aes::Aes192, key, iv, buf),
            _ => cbc_decrypt!(aes::Aes256, key, iv, buf),
        }
        unpad(&buf, 16)
    }
}

// ── 3DES-CBC ─────────────────────────────────────────────────────────

struct TripleDesCbc;

impl CipherAlgorithm for TripleDesCbc {
    fn uri(&self) -> &'static str {
        algorithm::TRIPLEDES_CBC
    }

    fn key_size(&self) -> usize {
        24
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        check_key(key, 24)?;
        let iv = random_iv::<8>();
        let mut buf = pad(plaintext, 8);
        cbc_encrypt!(des::TdesEde3, key, &iv, buf);
        Ok([iv.as_slice(), &buf].concat())
    }

    fn decrypt(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
        check_key(key, 24)?;
        if data.len() < 16 || data.len() % 8 != 0 {
            return Err(Error::Crypto("3DES data invalid length".into()));
        }
        let (iv, ciphertext) = data.split_at(8);
        let mut buf = ciphertext.to_vec();
        cbc_decrypt!(des::TdesEde3, key, iv, buf);
        unpad(&buf, 8)
    }
}

// ── Padding ──────────────────────────────────────────────────────────

fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let pad_len = block_size - (data.len() % block_size);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    padded
}

/// Strip XML Encryption padding.
///
/// Only the last byte (the pad length) is significant, so both PKCS#7 and
/// ISO 10126 filler are accepted.
fn unpad(data: &[u8], block_size: usize) -> Result<Vec<u8>, Error> {
    let Some(&last) = data.last() else {
        return Ok(Vec::new());
    };
    let pad_len = last as usize;
    if pad_len == 0 || pad_len > block_size || pad_len > data.len() {
        return Err(Error::Crypto("invalid padding".into()));
    }
    Ok(data[..data.len() - pad_len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_always_adds_a_block_fragment() {
        assert_eq!(pad(b"hello", 8).len(), 8);
        assert_eq!(pad(b"12345678", 8).len(), 16);
        assert_eq!(unpad(&pad(b"hello", 16), 16).unwrap(), b"hello");
    }

    #[test]
    fn test_iso10126_unpad() {
        let mut data = b"hello world!".to_vec();
        data.extend_from_slice(&[0xAB, 0xCD, 0xEF, 0x04]);
        assert_eq!(unpad(&data, 16).unwrap(), b"hello world!");
    }

    #[test]
    fn test_3des_round_trip() {
        let key = generate_key(algorithm::TRIPLEDES_CBC).unwrap();
        assert_eq!(key.len(), 24);
        let cipher = from_uri(algorithm::TRIPLEDES_CBC).unwrap();
        let ct = cipher.encrypt(&key, b"<Foo>Text</Foo>").unwrap();
        assert_eq!(ct.len() % 8, 0);
        assert_eq!(cipher.decrypt(&key, &ct).unwrap(), b"<Foo>Text</Foo>");
    }

    #[test]
    fn test_aes_round_trip_all_sizes() {
        for (uri, size) in [
            (algorithm::AES128_CBC, 16),
            (algorithm::AES192_CBC, 24),
            (algorithm::AES256_CBC, 32),
        ] {
            let key = generate_key(uri).unwrap();
            assert_eq!(key.len(), size);
            let cipher = from_uri(uri).unwrap();
            let ct = cipher.encrypt(&key, b"attack at dawn").unwrap();
            assert_eq!(cipher.decrypt(&key, &ct).unwrap(), b"attack at dawn");
        }
    }

    #[test]
    fn test_wrong_key_size_rejected() {
        let cipher = from_uri(algorithm::TRIPLEDES_CBC).unwrap();
        assert!(cipher.encrypt(&[0u8; 16], b"x").is_err());
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let cipher = from_uri(algorithm::AES128_CBC).unwrap();
        assert!(cipher.decrypt(&[0u8; 16], &[0u8; 20]).is_err());
    }
}
