#![forbid(unsafe_code)]

//! Key manager with named key store.

use crate::key::{Key, KeyData};
use crate::x509::Certificate;
use wsse_core::Error;

/// A collection of keys consulted while signing, verifying, encrypting
/// and decrypting.
#[derive(Debug, Default)]
pub struct KeysManager {
    keys: Vec<Key>,
}

impl KeysManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name.as_deref() == Some(name))
    }

    /// First key with RSA material, public or private.
    pub fn find_rsa(&self) -> Option<&Key> {
        self.keys
            .iter()
            .find(|k| matches!(&k.data, KeyData::Rsa { .. }))
    }

    /// First RSA key with a private component.
    pub fn find_rsa_private(&self) -> Option<&Key> {
        self.keys
            .iter()
            .find(|k| matches!(&k.data, KeyData::Rsa { private: Some(_), .. }))
    }

    /// Key whose leaf certificate has the given issuer name and decimal serial.
    pub fn find_by_issuer_serial(&self, issuer: &str, serial: &str) -> Option<&Key> {
        self.keys.iter().find(|k| {
            k.certificate()
                .and_then(|der| Certificate::from_der(der).ok())
                .is_some_and(|c| c.issuer_name() == issuer && c.serial_number() == serial)
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    pub fn first_key(&self) -> Result<&Key, Error> {
        self.keys
            .first()
            .ok_or_else(|| Error::KeyNotFound("no keys in manager".into()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyUsage;
    use crate::loader;
    use std::path::Path;

    fn keys_dir() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-data/keys")
    }

    #[test]
    fn test_lookup_by_kind_and_name() {
        let dir = keys_dir();
        let mut manager = KeysManager::new();
        assert!(manager.first_key().is_err());

        manager.add_key(Key::new(KeyData::Symmetric(vec![1; 24]), KeyUsage::Encrypt).with_name("session"));
        manager.add_key(loader::load_x509_cert_pem(&std::fs::read(dir.join("their_cert.pem")).unwrap()).unwrap());
        manager.add_key(loader::load_key_file(&dir.join("key.pem")).unwrap());

        assert_eq!(manager.len(), 3);
        assert!(manager.find_by_name("session").unwrap().symmetric_key_bytes().is_some());
        assert!(manager.find_rsa().unwrap().rsa_private_key().is_none());
        assert!(manager.find_rsa_private().unwrap().rsa_private_key().is_some());
    }

    #[test]
    fn test_find_by_issuer_serial() {
        let dir = keys_dir();
        let mut manager = KeysManager::new();
        manager.add_key(loader::load_key_pair(&dir.join("key.pem"), &dir.join("cert.pem")).unwrap());

        let issuer = "CN=example.com,OU=Little Dead Man Island,O=Green Herons,L=La Conner,ST=Washington,C=US";
        assert!(manager.find_by_issuer_serial(issuer, "1000").is_some());
        assert!(manager.find_by_issuer_serial(issuer, "1001").is_none());
    }
}
