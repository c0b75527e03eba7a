use bazaar_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("attachment too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AttachmentError {
    fn from(e: reqwest::Error) -> Self {
        AttachmentError::Network(e.to_string())
    }
}
