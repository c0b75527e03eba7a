use thiserror::Error;

pub type BazaarResult<T> = Result<T, BazaarError>;

#[derive(Debug, Error)]
pub enum BazaarError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
