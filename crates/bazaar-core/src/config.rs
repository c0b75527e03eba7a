use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BazaarError, BazaarResult};

/// Top-level client configuration (loaded from bazaar.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BazaarConfig {
    pub api: ApiConfig,
    pub attachments: AttachmentConfig,
    pub translation: TranslationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Marketplace backend base URL (default: http://localhost:8080/api)
    pub base_url: String,
    /// Name of the environment variable holding the bearer token
    pub token_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Refuse plaintext HTTP base URLs (warn only when false)
    pub enforce_tls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    /// Largest file accepted for upload, in bytes (default: 25 MiB)
    pub max_bytes: u64,
    /// Where downloaded attachments are saved when no directory is given
    pub download_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translation endpoint (GET, unauthenticated)
    pub endpoint: String,
    /// Fixed client identifier sent as the `client` query parameter
    pub client_id: String,
    /// Maximum cached translations (default: 1000)
    pub cache_max_entries: usize,
    /// Cached translation lifetime in seconds (default: 24h)
    pub cache_ttl_secs: u64,
    /// Upper bound on in-flight translation requests (default: 4)
    pub max_concurrent_requests: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".into(),
            token_env: "BAZAAR_API_TOKEN".into(),
            timeout_secs: 30,
            enforce_tls: false,
        }
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_bytes: 25 * 1024 * 1024,
            download_dir: PathBuf::from("."),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.googleapis.com/translate_a/single".into(),
            client_id: "gtx".into(),
            cache_max_entries: 1000,
            cache_ttl_secs: 24 * 60 * 60,
            max_concurrent_requests: 4,
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl BazaarConfig {
    /// Load configuration from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> BazaarResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| BazaarError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> BazaarResult<Self> {
        toml::from_str(content).map_err(|e| BazaarError::Config(e.to_string()))
    }
}
