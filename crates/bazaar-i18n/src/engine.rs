//! Best-effort translation engine.
//!
//! Translation never fails from the caller's point of view: any network,
//! status, or shape problem is logged and the original text comes back as
//! [`TranslationOutcome::Fallback`]. Outbound requests share one semaphore,
//! so fan-out (`translate_to_multiple`, `batch_translate`) never has more
//! than `max_concurrent_requests` calls in flight.

use bazaar_core::config::TranslationConfig;
use bazaar_core::{TranslatedMessage, TranslationMetadata};
use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::backend::{HttpTranslator, TranslateRequest, TranslationBackend};
use crate::cache::TranslationCache;
use crate::detect::{LanguageDetector, ScriptDetector};
use crate::error::TranslateError;

/// Confidence attached to every translated message. Not measured.
pub const PLACEHOLDER_CONFIDENCE: f32 = 0.95;

pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// What a translation call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// Translated (or trivially unchanged, e.g. same source and target)
    Translated(String),
    /// Translation failed; `original` is the untouched input
    Fallback {
        original: String,
        reason: TranslateError,
    },
}

impl TranslationOutcome {
    pub fn text(&self) -> &str {
        match self {
            TranslationOutcome::Translated(text) => text,
            TranslationOutcome::Fallback { original, .. } => original,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            TranslationOutcome::Translated(text) => text,
            TranslationOutcome::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TranslationOutcome::Fallback { .. })
    }
}

pub struct TranslationEngine {
    backend: Arc<dyn TranslationBackend>,
    cache: Arc<TranslationCache>,
    detector: Arc<dyn LanguageDetector>,
    limiter: Arc<Semaphore>,
}

impl TranslationEngine {
    pub fn new(backend: Arc<dyn TranslationBackend>, cache: Arc<TranslationCache>) -> Self {
        Self {
            backend,
            cache,
            detector: Arc::new(ScriptDetector::builtin()),
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
        }
    }

    /// Engine over the HTTP endpoint, cache, and concurrency limit from config.
    pub fn from_config(config: &TranslationConfig) -> Result<Self, TranslateError> {
        let backend = Arc::new(HttpTranslator::from_config(config)?);
        let cache = Arc::new(TranslationCache::from_config(config));
        Ok(Self::new(backend, cache).with_max_concurrent(config.max_concurrent_requests))
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Cap in-flight backend requests (minimum 1).
    pub fn with_max_concurrent(mut self, permits: usize) -> Self {
        self.limiter = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    pub fn detector(&self) -> &dyn LanguageDetector {
        self.detector.as_ref()
    }

    /// Translate `text`, reporting whether the result is a real translation
    /// or a fallback to the original.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        if source == target || text.trim().is_empty() {
            return TranslationOutcome::Translated(text.to_string());
        }

        if let Some(hit) = self.cache.get(text, source, target) {
            debug!(source, target, "translation cache hit");
            return TranslationOutcome::Translated(hit);
        }

        match self.fetch_remote(text, source, target).await {
            Ok(translated) => {
                self.cache.set(text, source, target, &translated);
                TranslationOutcome::Translated(translated)
            }
            Err(reason) => {
                warn!(source, target, error = %reason, "translation failed, using original text");
                TranslationOutcome::Fallback {
                    original: text.to_string(),
                    reason,
                }
            }
        }
    }

    /// Translated text, or the original text if translation failed.
    pub async fn translate_text(&self, text: &str, source: &str, target: &str) -> String {
        self.translate(text, source, target).await.into_text()
    }

    /// Translate into several languages at once.
    ///
    /// Duplicate targets and `source` itself are skipped.
    pub async fn translate_to_multiple<S: AsRef<str>>(
        &self,
        text: &str,
        source: &str,
        targets: &[S],
    ) -> BTreeMap<String, String> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = targets
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| *t != source && seen.insert(*t))
            .collect();

        let results = join_all(unique.into_iter().map(|target| async move {
            (
                target.to_string(),
                self.translate_text(text, source, target).await,
            )
        }))
        .await;

        results.into_iter().collect()
    }

    /// Translate a chat message and wrap it with metadata.
    ///
    /// When `source` is `None` it is detected from the text.
    pub async fn create_translated_message(
        &self,
        original: &str,
        target: &str,
        source: Option<&str>,
    ) -> TranslatedMessage {
        let source = match source {
            Some(s) => s.to_string(),
            None => self.detector.detect(original).to_string(),
        };
        let outcome = self.translate(original, &source, target).await;

        TranslatedMessage {
            original: original.to_string(),
            translated: outcome.text().to_string(),
            source_language: source,
            target_language: target.to_string(),
            metadata: TranslationMetadata {
                translated_at: now_millis(),
                confidence: PLACEHOLDER_CONFIDENCE,
                degraded: outcome.is_fallback(),
            },
        }
    }

    /// Translate a list of messages, preserving order.
    pub async fn batch_translate<S: AsRef<str>>(
        &self,
        messages: &[S],
        source: &str,
        target: &str,
    ) -> Vec<String> {
        join_all(
            messages
                .iter()
                .map(|m| self.translate_text(m.as_ref(), source, target)),
        )
        .await
    }

    /// Like [`translate_text`](Self::translate_text), but also survives a
    /// panicking backend.
    pub async fn translate_with_fallback(&self, text: &str, source: &str, target: &str) -> String {
        if source == target {
            return text.to_string();
        }
        match AssertUnwindSafe(self.translate(text, source, target))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome.into_text(),
            Err(_) => {
                error!(source, target, "translation panicked, using original text");
                text.to_string()
            }
        }
    }

    async fn fetch_remote(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| TranslateError::Network("translation limiter closed".to_string()))?;

        let request = TranslateRequest {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };
        let body = self.backend.fetch(&request).await?;
        reconstruct_translation(&body)
    }
}

/// Join the first element of every segment in the response's first array.
///
/// `[[["Hola ", "Hello ", ...], ["mundo", "world", ...]], null, "en"]` → `"Hola mundo"`
pub fn reconstruct_translation(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed("missing segment array".to_string()))?;

    let mut translated = String::new();
    let mut found = false;
    for segment in segments {
        if let Some(part) = segment.get(0).and_then(Value::as_str) {
            translated.push_str(part);
            found = true;
        }
    }
    if !found {
        return Err(TranslateError::Malformed(
            "no translated segments".to_string(),
        ));
    }
    Ok(translated)
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
