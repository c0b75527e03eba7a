//! bazaar-crypto: client-side encryption for chat attachments
//!
//! Construction: secretbox-style XChaCha20-Poly1305 (stream cipher + Poly1305 MAC)
//!
//! Payload format (both media):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! - Text medium: `base64(nonce || ciphertext)`, key as base64
//! - File medium: raw bytes, always labelled `application/octet-stream`
//!
//! Keys are 256-bit, generated per attachment from the OS-seeded CSPRNG and
//! never persisted here.

pub mod cipher;
pub mod error;
pub mod keys;

pub use cipher::{
    decrypt, decrypt_file, decrypt_text, encrypt, encrypt_file, encrypt_text, EncryptedBlob,
};
pub use error::CryptoError;
pub use keys::{generate_key, generate_key_b64, AttachmentKey};

/// Size of an attachment key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Content type declared for every encrypted file payload
pub const OPAQUE_MIME_TYPE: &str = "application/octet-stream";
