//! Attachment keys: generation and base64 transport encoding

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::CryptoError;
use crate::KEY_SIZE;

/// A per-attachment 256-bit key. Zeroized on drop.
#[derive(Clone)]
pub struct AttachmentKey {
    bytes: [u8; KEY_SIZE],
}

impl AttachmentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Build a key from an arbitrary slice; the slice must be exactly 32 bytes.
    pub fn from_slice(raw: &[u8]) -> Result<Self, CryptoError> {
        if raw.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {}",
                raw.len()
            )));
        }
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(raw);
        Ok(Self { bytes })
    }

    /// Decode a base64 (standard alphabet) key as produced by [`AttachmentKey::to_b64`].
    pub fn from_b64(encoded: &str) -> Result<Self, CryptoError> {
        let raw = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| CryptoError::InvalidKey(format!("base64 decode: {e}")))?,
        );
        Self::from_slice(&raw)
    }

    pub fn to_b64(&self) -> String {
        STANDARD.encode(self.bytes)
    }
}

impl Drop for AttachmentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for AttachmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit attachment key.
pub fn generate_key() -> AttachmentKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    AttachmentKey::from_bytes(bytes)
}

/// Generate a random key and return it in its base64 transport form.
pub fn generate_key_b64() -> String {
    generate_key().to_b64()
}
