#![forbid(unsafe_code)]

//! Encryption context: holds the keys manager.

use wsse_keys::KeysManager;

/// Context for XML-Enc operations.
///
/// Encryption wraps session keys under the first RSA key (usually the
/// recipient's certificate); decryption unwraps them with the first RSA
/// private key.
pub struct EncContext {
    pub keys_manager: KeysManager,
}

impl EncContext {
    pub fn new(keys_manager: KeysManager) -> Self {
        Self { keys_manager }
    }
}
