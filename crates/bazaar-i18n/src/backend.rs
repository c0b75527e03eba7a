//! Translation endpoint seam and its HTTP implementation

use async_trait::async_trait;
use bazaar_core::config::TranslationConfig;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

use crate::error::TranslateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    pub text: String,
    pub source: String,
    pub target: String,
}

/// Something that can answer a translation request with the endpoint's raw
/// JSON body.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn fetch(&self, request: &TranslateRequest) -> Result<Value, TranslateError>;
}

/// Unauthenticated GET against a `translate_a/single`-style endpoint.
///
/// Query: `client={client_id}&sl={source}&tl={target}&dt=t&q={text}`
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: Url,
    client_id: String,
}

impl HttpTranslator {
    pub fn new(endpoint: &str, client_id: &str, timeout: Duration) -> Result<Self, TranslateError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            TranslateError::Config(format!("invalid translation endpoint {endpoint}: {e}"))
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            client_id: client_id.to_string(),
        })
    }

    pub fn from_config(config: &TranslationConfig) -> Result<Self, TranslateError> {
        Self::new(
            &config.endpoint,
            &config.client_id,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn request_url(&self, request: &TranslateRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client", &self.client_id)
            .append_pair("sl", &request.source)
            .append_pair("tl", &request.target)
            .append_pair("dt", "t")
            .append_pair("q", &request.text);
        url
    }
}

#[async_trait]
impl TranslationBackend for HttpTranslator {
    async fn fetch(&self, request: &TranslateRequest) -> Result<Value, TranslateError> {
        let resp = self.client.get(self.request_url(request)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| TranslateError::Malformed(e.to_string()))
    }
}
