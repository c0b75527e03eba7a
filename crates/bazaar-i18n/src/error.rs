use thiserror::Error;

/// Translation failures. Recovered inside the engine; callers only see
/// them as the reason attached to a fallback outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Network(String),

    #[error("translation endpoint returned HTTP {0}")]
    Status(u16),

    #[error("malformed translation response: {0}")]
    Malformed(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        TranslateError::Network(e.to_string())
    }
}
