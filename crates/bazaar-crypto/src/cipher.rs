//! Stateless secretbox encryption over binary and text payloads
//!
//! Every call draws its own 24-byte nonce, so the functions are safe to use
//! concurrently with a shared key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::AttachmentKey;
use crate::{KEY_SIZE, NONCE_SIZE, OPAQUE_MIME_TYPE, TAG_SIZE};

/// An encrypted file payload ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// `[24-byte nonce][ciphertext][16-byte tag]`
    pub bytes: Vec<u8>,
    /// Always `application/octet-stream`, whatever the original file type was
    pub mime_type: &'static str,
}

/// Encrypt `plaintext` under a raw 32-byte key.
///
/// Returns: `[24-byte nonce][ciphertext][16-byte tag]`
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::Encryption(format!(
            "key must be {KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    let cipher = XChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::Encryption(format!("cipher init: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt a `[nonce][ciphertext][tag]` payload under a raw 32-byte key.
///
/// Authentication is verified before any plaintext is returned.
pub fn decrypt(combined: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::Decryption(format!(
            "key must be {KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    if combined.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Decryption(format!(
            "payload too short: {} bytes (minimum {})",
            combined.len(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::Decryption(format!("cipher init: {e}")))?;

    cipher.decrypt(nonce, ciphertext).map_err(|_| {
        CryptoError::Decryption("invalid key or corrupted ciphertext".to_string())
    })
}

/// Encrypt a short text message. Key and output are base64.
pub fn encrypt_text(plaintext: &str, key_b64: &str) -> Result<String, CryptoError> {
    let key = decode_b64(key_b64).map_err(CryptoError::Encryption)?;
    let combined = encrypt(plaintext.as_bytes(), &key)?;
    Ok(STANDARD.encode(combined))
}

/// Decrypt a base64 payload produced by [`encrypt_text`].
pub fn decrypt_text(combined_b64: &str, key_b64: &str) -> Result<String, CryptoError> {
    let key = decode_b64(key_b64).map_err(CryptoError::Decryption)?;
    let combined = decode_b64(combined_b64).map_err(CryptoError::Decryption)?;
    let plaintext = decrypt(&combined, &key)?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".to_string()))
}

/// Encrypt file content for upload.
pub fn encrypt_file(content: &[u8], key: &AttachmentKey) -> Result<EncryptedBlob, CryptoError> {
    let bytes = encrypt(content, key.as_bytes())?;
    tracing::debug!(
        plaintext_bytes = content.len(),
        ciphertext_bytes = bytes.len(),
        "encrypted file payload"
    );
    Ok(EncryptedBlob {
        bytes,
        mime_type: OPAQUE_MIME_TYPE,
    })
}

/// Decrypt downloaded file content.
pub fn decrypt_file(encrypted: &[u8], key: &AttachmentKey) -> Result<Vec<u8>, CryptoError> {
    decrypt(encrypted, key.as_bytes())
}

fn decode_b64(encoded: &str) -> Result<Zeroizing<Vec<u8>>, String> {
    STANDARD
        .decode(encoded.trim())
        .map(Zeroizing::new)
        .map_err(|e| format!("base64 decode: {e}"))
}
