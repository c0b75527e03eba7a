//! Attachment pipeline: encrypt-then-upload and fetch-then-decrypt
//!
//! Encryption and decryption run inline on the calling task. Nothing is
//! retried; the first HTTP or crypto failure is returned to the caller.

use bazaar_core::config::AttachmentConfig;
use bazaar_core::Attachment;
use bazaar_crypto::{decrypt_file, encrypt_file, generate_key, AttachmentKey};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::{AttachmentApi, EncryptedUpload};
use crate::error::AttachmentError;
use crate::invalidation::MessageListCache;
use crate::save::save_atomically;

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct UploadedAttachment {
    pub attachment: Attachment,
    /// Base64 key the content was encrypted under
    pub key_b64: String,
}

pub struct AttachmentPipeline {
    api: Arc<dyn AttachmentApi>,
    message_lists: Arc<MessageListCache>,
    max_bytes: u64,
}

impl AttachmentPipeline {
    pub fn new(api: Arc<dyn AttachmentApi>, message_lists: Arc<MessageListCache>) -> Self {
        Self::from_config(api, message_lists, &AttachmentConfig::default())
    }

    pub fn from_config(
        api: Arc<dyn AttachmentApi>,
        message_lists: Arc<MessageListCache>,
        config: &AttachmentConfig,
    ) -> Self {
        Self {
            api,
            message_lists,
            max_bytes: config.max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Encrypt the file at `path` and upload it to `chat_id`.
    ///
    /// Uses `key` when supplied, otherwise generates a fresh one.
    pub async fn upload_attachment(
        &self,
        chat_id: &str,
        path: &Path,
        key: Option<&AttachmentKey>,
    ) -> Result<UploadedAttachment, AttachmentError> {
        let size = tokio::fs::metadata(path).await?.len();
        self.check_size(size)?;
        let content = tokio::fs::read(path).await?;
        debug!(path = %path.display(), bytes = content.len(), "read attachment");
        self.upload_bytes(chat_id, &content, key).await
    }

    /// Encrypt in-memory `content` and upload it to `chat_id`.
    pub async fn upload_bytes(
        &self,
        chat_id: &str,
        content: &[u8],
        key: Option<&AttachmentKey>,
    ) -> Result<UploadedAttachment, AttachmentError> {
        self.check_size(content.len() as u64)?;

        let generated;
        let key = match key {
            Some(k) => k,
            None => {
                generated = generate_key();
                &generated
            }
        };

        let blob = encrypt_file(content, key)?;
        let key_b64 = key.to_b64();
        let upload = EncryptedUpload {
            blob,
            encryption_key: key_b64.clone(),
        };

        let attachment = self.api.upload(chat_id, upload).await?;
        self.message_lists.invalidate(chat_id);

        info!(
            chat_id,
            attachment_id = %attachment.id,
            bytes = content.len(),
            "attachment uploaded"
        );
        Ok(UploadedAttachment {
            attachment,
            key_b64,
        })
    }

    /// Download and decrypt an attachment without touching the filesystem.
    ///
    /// `encrypted_key` is the base64 key from the attachment's metadata record.
    pub async fn fetch_decrypted(
        &self,
        attachment_id: &str,
        encrypted_key: &str,
    ) -> Result<Vec<u8>, AttachmentError> {
        let key = AttachmentKey::from_b64(encrypted_key)?;
        let ciphertext = self.api.download(attachment_id).await?;
        let plaintext = decrypt_file(&ciphertext, &key)?;
        debug!(
            attachment_id,
            ciphertext_bytes = ciphertext.len(),
            bytes = plaintext.len(),
            "attachment decrypted"
        );
        Ok(plaintext)
    }

    /// Download, decrypt, and save an attachment as `dest_dir/{file_name}`.
    ///
    /// Nothing is written unless download and decryption both succeed.
    pub async fn download_attachment(
        &self,
        attachment_id: &str,
        file_name: &str,
        encrypted_key: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, AttachmentError> {
        let plaintext = self.fetch_decrypted(attachment_id, encrypted_key).await?;

        let dir = dest_dir.to_path_buf();
        let name = file_name.to_string();
        let saved = tokio::task::spawn_blocking(move || save_atomically(&dir, &name, &plaintext))
            .await
            .map_err(|e| AttachmentError::Io(std::io::Error::other(e)))??;

        info!(attachment_id, path = %saved.display(), "attachment saved");
        Ok(saved)
    }

    /// Delete an attachment and invalidate the chat's cached message lists.
    pub async fn delete_attachment(
        &self,
        attachment_id: &str,
        chat_id: &str,
    ) -> Result<(), AttachmentError> {
        self.api.delete(attachment_id).await?;
        self.message_lists.invalidate(chat_id);
        info!(chat_id, attachment_id, "attachment deleted");
        Ok(())
    }

    fn check_size(&self, size: u64) -> Result<(), AttachmentError> {
        if size > self.max_bytes {
            return Err(AttachmentError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory backend that records what it was sent.
    #[derive(Default)]
    struct MemoryApi {
        blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
        fail_downloads: bool,
    }

    #[async_trait]
    impl AttachmentApi for MemoryApi {
        async fn upload(
            &self,
            chat_id: &str,
            upload: EncryptedUpload,
        ) -> Result<Attachment, AttachmentError> {
            let mut blobs = self.blobs.lock();
            let id = format!("att-{}", blobs.len() + 1);
            let size = upload.blob.bytes.len() as u64;
            blobs.insert(id.clone(), (upload.blob.bytes, upload.encryption_key.clone()));
            Ok(Attachment {
                id,
                message_id: Some(format!("{chat_id}-msg")),
                file_name: crate::api::OPAQUE_FILE_NAME.to_string(),
                file_size: size,
                mime_type: upload.blob.mime_type.to_string(),
                encrypted_key: upload.encryption_key,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            })
        }

        async fn download(&self, attachment_id: &str) -> Result<Vec<u8>, AttachmentError> {
            if self.fail_downloads {
                return Err(AttachmentError::Status {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            self.blobs
                .lock()
                .get(attachment_id)
                .map(|(bytes, _)| bytes.clone())
                .ok_or(AttachmentError::Status {
                    status: 404,
                    body: "not found".into(),
                })
        }

        async fn delete(&self, attachment_id: &str) -> Result<(), AttachmentError> {
            self.blobs.lock().remove(attachment_id);
            Ok(())
        }
    }

    fn pipeline(api: Arc<MemoryApi>) -> (AttachmentPipeline, Arc<MessageListCache>) {
        let lists = Arc::new(MessageListCache::new());
        (AttachmentPipeline::new(api, lists.clone()), lists)
    }

    #[tokio::test]
    async fn upload_sends_only_ciphertext() {
        let api = Arc::new(MemoryApi::default());
        let (pipeline, _) = pipeline(api.clone());

        let up = pipeline
            .upload_bytes("chat-1", b"plain contract terms", None)
            .await
            .unwrap();

        let blobs = api.blobs.lock();
        let (stored, key) = &blobs[&up.attachment.id];
        assert_ne!(stored.as_slice(), b"plain contract terms");
        assert_eq!(stored.len(), 24 + 20 + 16);
        assert_eq!(key, &up.key_b64);
        assert_eq!(up.attachment.mime_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn upload_uses_supplied_key() {
        let api = Arc::new(MemoryApi::default());
        let (pipeline, _) = pipeline(api);
        let key = generate_key();

        let up = pipeline.upload_bytes("c", b"x", Some(&key)).await.unwrap();
        assert_eq!(up.key_b64, key.to_b64());
    }

    #[tokio::test]
    async fn upload_invalidates_message_lists() {
        let api = Arc::new(MemoryApi::default());
        let (pipeline, lists) = pipeline(api);
        let before = lists.epoch("chat-7");

        pipeline.upload_bytes("chat-7", b"x", None).await.unwrap();
        assert!(!lists.is_current("chat-7", before));
    }

    #[tokio::test]
    async fn upload_rejects_oversized_content() {
        let api = Arc::new(MemoryApi::default());
        let lists = Arc::new(MessageListCache::new());
        let config = AttachmentConfig {
            max_bytes: 4,
            ..Default::default()
        };
        let pipeline = AttachmentPipeline::from_config(api.clone(), lists, &config);

        let err = pipeline.upload_bytes("c", b"12345", None).await.unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { size: 5, limit: 4 }));
        assert!(api.blobs.lock().is_empty());
    }

    #[tokio::test]
    async fn upload_from_path_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photo.jpg");
        let content: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&src, &content).unwrap();

        let api = Arc::new(MemoryApi::default());
        let (pipeline, _) = pipeline(api);
        let up = pipeline.upload_attachment("c", &src, None).await.unwrap();

        let plain = pipeline
            .fetch_decrypted(&up.attachment.id, &up.key_b64)
            .await
            .unwrap();
        assert_eq!(plain, content);
    }

    #[tokio::test]
    async fn download_saves_decrypted_file() {
        let api = Arc::new(MemoryApi::default());
        let (pipeline, _) = pipeline(api);
        let up = pipeline.upload_bytes("c", b"shipping label", None).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = pipeline
            .download_attachment(&up.attachment.id, "label.txt", &up.key_b64, dir.path())
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"shipping label");
    }

    #[tokio::test]
    async fn wrong_key_writes_nothing() {
        let api = Arc::new(MemoryApi::default());
        let (pipeline, _) = pipeline(api);
        let up = pipeline.upload_bytes("c", b"secret", None).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let other_key = generate_key().to_b64();
        let err = pipeline
            .download_attachment(&up.attachment.id, "s.txt", &other_key, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::Crypto(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn http_failure_writes_nothing() {
        let api = Arc::new(MemoryApi {
            fail_downloads: true,
            ..Default::default()
        });
        let (pipeline, _) = pipeline(api);

        let dir = tempfile::tempdir().unwrap();
        let err = pipeline
            .download_attachment("att-1", "s.txt", &generate_key().to_b64(), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::Status { status: 503, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn malformed_key_is_crypto_error() {
        let api = Arc::new(MemoryApi::default());
        let (pipeline, _) = pipeline(api);
        let err = pipeline.fetch_decrypted("att-1", "short").await.unwrap_err();
        assert!(matches!(err, AttachmentError::Crypto(_)));
    }

    #[tokio::test]
    async fn delete_removes_and_invalidates() {
        let api = Arc::new(MemoryApi::default());
        let (pipeline, lists) = pipeline(api.clone());
        let up = pipeline.upload_bytes("chat-3", b"x", None).await.unwrap();
        let epoch = lists.epoch("chat-3");

        pipeline
            .delete_attachment(&up.attachment.id, "chat-3")
            .await
            .unwrap();
        assert!(api.blobs.lock().is_empty());
        assert!(!lists.is_current("chat-3", epoch));
    }
}
