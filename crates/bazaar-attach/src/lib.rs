//! bazaar-attach: encrypted chat attachments
//!
//! Upload:   read file → generate/accept key → encrypt → multipart POST (ciphertext + key)
//!           → invalidate the chat's cached message lists
//! Download: authenticated GET → decrypt with the key from the attachment record
//!           → temp file in the destination dir → atomic rename
//!
//! The backend never sees plaintext, but it does receive the key at upload
//! time; this protects against passive storage inspection only.

pub mod api;
pub mod error;
pub mod invalidation;
pub mod pipeline;
pub mod save;

pub use api::{AttachmentApi, EncryptedUpload, HttpAttachmentApi};
pub use error::AttachmentError;
pub use invalidation::MessageListCache;
pub use pipeline::{AttachmentPipeline, UploadedAttachment};
