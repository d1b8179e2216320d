#![forbid(unsafe_code)]

//! DSig context: keys and options for signature operations.

use wsse_keys::KeysManager;

/// Context for XML-DSig operations.
pub struct DsigContext {
    pub keys_manager: KeysManager,
    /// Log the canonical pre-digest and pre-signature octets.
    pub debug: bool,
    /// Verify only with keys of the manager; `KeyInfo` contents are not
    /// consulted.
    pub trusted_keys_only: bool,
}

impl DsigContext {
    pub fn new(keys_manager: KeysManager) -> Self {
        Self {
            keys_manager,
            debug: false,
            trusted_keys_only: false,
        }
    }
}
