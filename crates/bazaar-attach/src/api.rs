//! Marketplace attachment API: the backend seam and its HTTP client

use async_trait::async_trait;
use bazaar_core::config::ApiConfig;
use bazaar_core::Attachment;
use bazaar_crypto::EncryptedBlob;
use reqwest::{multipart, Url};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::AttachmentError;

/// Filename sent with every upload; the real name never leaves the client
/// inside the file part.
pub const OPAQUE_FILE_NAME: &str = "encrypted.bin";

/// Ciphertext plus the base64 key, as submitted to the backend.
#[derive(Debug, Clone)]
pub struct EncryptedUpload {
    pub blob: EncryptedBlob,
    pub encryption_key: String,
}

/// Backend operations the attachment pipeline depends on.
#[async_trait]
pub trait AttachmentApi: Send + Sync {
    /// Store an encrypted attachment in `chat_id` and return its metadata record.
    async fn upload(
        &self,
        chat_id: &str,
        upload: EncryptedUpload,
    ) -> Result<Attachment, AttachmentError>;

    /// Fetch the raw encrypted bytes of an attachment.
    async fn download(&self, attachment_id: &str) -> Result<Vec<u8>, AttachmentError>;

    async fn delete(&self, attachment_id: &str) -> Result<(), AttachmentError>;
}

/// reqwest client for the chat-scoped attachment endpoints.
///
/// - `POST {base}/chats/{chat_id}/attachments` (multipart: `file`, `encryptionKey`)
/// - `GET {base}/attachments/{id}/download`
/// - `DELETE {base}/attachments/{id}`
pub struct HttpAttachmentApi {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl HttpAttachmentApi {
    pub fn new(
        base_url: &str,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self, AttachmentError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AttachmentError::Config(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AttachmentError::Config(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Build a client from `[api]` config.
    ///
    /// If `enforce_tls` is true and the base URL uses HTTP, this returns an error.
    /// Otherwise, a warning is logged for non-HTTPS endpoints.
    pub fn from_config(api: &ApiConfig, token: SecretString) -> Result<Self, AttachmentError> {
        // parsed form: the scheme is normalized to lowercase, surrounding spaces dropped
        let base_url = Url::parse(&api.base_url).map_err(|e| {
            AttachmentError::Config(format!("invalid base URL {}: {e}", api.base_url))
        })?;
        if base_url.scheme() == "http" {
            if api.enforce_tls {
                return Err(AttachmentError::Config(format!(
                    "API base URL uses plaintext HTTP ({base_url}), but enforce_tls is enabled. \
                     Use an HTTPS endpoint or set api.enforce_tls = false for local development."
                )));
            }
            tracing::warn!(
                base_url = %base_url,
                "API base URL uses plaintext HTTP; the bearer token and attachment keys \
                 are transmitted unencrypted"
            );
        }
        Self::new(
            base_url.as_str(),
            token,
            Duration::from_secs(api.timeout_secs),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Turn a non-2xx response into `AttachmentError::Status`.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, AttachmentError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(AttachmentError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl AttachmentApi for HttpAttachmentApi {
    async fn upload(
        &self,
        chat_id: &str,
        upload: EncryptedUpload,
    ) -> Result<Attachment, AttachmentError> {
        let url = self.endpoint(&["chats", chat_id, "attachments"]);
        let file_part = multipart::Part::bytes(upload.blob.bytes)
            .file_name(OPAQUE_FILE_NAME)
            .mime_str(upload.blob.mime_type)?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("encryptionKey", upload.encryption_key);

        let resp = self
            .client
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .multipart(form)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<Attachment>().await?)
    }

    async fn download(&self, attachment_id: &str) -> Result<Vec<u8>, AttachmentError> {
        let url = self.endpoint(&["attachments", attachment_id, "download"]);
        let resp = self
            .client
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn delete(&self, attachment_id: &str) -> Result<(), AttachmentError> {
        let url = self.endpoint(&["attachments", attachment_id]);
        let resp = self
            .client
            .delete(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> SecretString {
        SecretString::from("test-token".to_string())
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api =
            HttpAttachmentApi::new("https://m.example.com/api/", token(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            api.endpoint(&["chats", "c1", "attachments"]).as_str(),
            "https://m.example.com/api/chats/c1/attachments"
        );
    }

    #[test]
    fn test_endpoint_escapes_ids() {
        let api = HttpAttachmentApi::new("https://m.example.com/api", token(), Duration::from_secs(1))
            .unwrap();
        let url = api.endpoint(&["attachments", "a/../b", "download"]);
        assert_eq!(
            url.as_str(),
            "https://m.example.com/api/attachments/a%2F..%2Fb/download"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpAttachmentApi::new("not a url", token(), Duration::from_secs(1));
        assert!(matches!(result, Err(AttachmentError::Config(_))));
    }

    #[test]
    fn test_from_config_http_warning() {
        // HTTP base URL with enforce_tls=false should succeed (but log warning)
        let api = ApiConfig {
            base_url: "http://localhost:8080/api".into(),
            enforce_tls: false,
            ..Default::default()
        };
        assert!(HttpAttachmentApi::from_config(&api, token()).is_ok());
    }

    #[test]
    fn test_from_config_http_enforce_tls() {
        let api = ApiConfig {
            base_url: "http://insecure:8080/api".into(),
            enforce_tls: true,
            ..Default::default()
        };
        let err = HttpAttachmentApi::from_config(&api, token())
            .err()
            .expect("HTTP + enforce_tls must fail");
        assert!(err.to_string().contains("enforce_tls"));
    }

    #[test]
    fn test_from_config_enforce_tls_normalizes_scheme() {
        for base_url in [
            "HTTP://insecure:8080/api",
            " http://insecure:8080/api",
            "Http://insecure:8080/api",
        ] {
            let api = ApiConfig {
                base_url: base_url.into(),
                enforce_tls: true,
                ..Default::default()
            };
            let result = HttpAttachmentApi::from_config(&api, token());
            assert!(
                matches!(result, Err(AttachmentError::Config(ref msg)) if msg.contains("enforce_tls")),
                "{base_url:?} must be rejected with enforce_tls"
            );
        }
    }

    #[test]
    fn test_from_config_invalid_url() {
        let api = ApiConfig {
            base_url: "not a url".into(),
            enforce_tls: true,
            ..Default::default()
        };
        let result = HttpAttachmentApi::from_config(&api, token());
        assert!(matches!(result, Err(AttachmentError::Config(_))));
    }

    #[test]
    fn test_from_config_https() {
        let api = ApiConfig {
            base_url: "https://market.example.com/api".into(),
            enforce_tls: true,
            ..Default::default()
        };
        assert!(HttpAttachmentApi::from_config(&api, token()).is_ok());
    }
}
