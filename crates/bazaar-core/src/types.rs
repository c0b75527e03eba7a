use serde::{Deserialize, Serialize};

/// Attachment metadata record as returned by the marketplace backend.
///
/// `encrypted_key` is the base64 attachment key stored alongside the
/// ciphertext; whoever can read this record can decrypt the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub message_id: Option<String>,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub encrypted_key: String,
    pub created_at: String,
}

/// A chat message paired with its translation. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedMessage {
    pub original: String,
    pub translated: String,
    pub source_language: String,
    pub target_language: String,
    pub metadata: TranslationMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMetadata {
    /// Unix timestamp in milliseconds
    pub translated_at: u64,
    /// Placeholder; not derived from the translation response
    pub confidence: f32,
    /// True when translation failed and `translated` is the original text
    #[serde(default)]
    pub degraded: bool,
}
