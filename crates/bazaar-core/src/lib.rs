pub mod config;
pub mod error;
pub mod types;

pub use config::BazaarConfig;
pub use error::{BazaarError, BazaarResult};
pub use types::{Attachment, TranslatedMessage, TranslationMetadata};
