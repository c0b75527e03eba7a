//! Heuristic, script-based language detection
//!
//! Each language owns one single-character pattern over its script block;
//! the score is the number of matching characters. Languages sharing a
//! script (Hindi/Marathi, Arabic/Urdu, the Latin languages) only separate
//! on characters unique to one of them, otherwise the earlier catalog entry
//! wins.

use regex::Regex;
use std::sync::LazyLock;

/// Returned when there is nothing to go on.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Script patterns, one per catalog language, in catalog order.
const SCRIPT_PATTERNS: &[(&str, &str)] = &[
    ("en", r"[A-Za-z]"),
    ("hi", r"[\x{0900}-\x{097F}]"),
    ("bn", r"[\x{0980}-\x{09FF}]"),
    ("te", r"[\x{0C00}-\x{0C7F}]"),
    ("mr", r"[\x{0900}-\x{097F}]"),
    ("ta", r"[\x{0B80}-\x{0BFF}]"),
    ("gu", r"[\x{0A80}-\x{0AFF}]"),
    ("kn", r"[\x{0C80}-\x{0CFF}]"),
    ("ml", r"[\x{0D00}-\x{0D7F}]"),
    ("pa", r"[\x{0A00}-\x{0A7F}]"),
    ("ar", r"[\x{0600}-\x{06FF}]"),
    ("ur", r"[\x{0600}-\x{06FF}\x{0750}-\x{077F}\x{FB50}-\x{FDFF}]"),
    ("es", r"[A-Za-zÁÉÍÓÚÜÑáéíóúüñ¿¡]"),
    ("fr", r"[A-Za-zÀÂÆÇÉÈÊËÎÏÔŒÙÛÜŸàâæçéèêëîïôœùûüÿ]"),
    ("de", r"[A-Za-zÄÖÜäöüß]"),
    ("pt", r"[A-Za-zÁÂÃÀÇÉÊÍÓÔÕÚáâãàçéêíóôõú]"),
    ("ru", r"[\x{0400}-\x{04FF}]"),
    ("zh", r"[\x{4E00}-\x{9FFF}]"),
    ("ja", r"[\x{3040}-\x{30FF}\x{4E00}-\x{9FFF}]"),
    ("ko", r"[\x{AC00}-\x{D7AF}\x{1100}-\x{11FF}]"),
];

/// A language detector. Only `scores` is required; a statistical detector
/// can override `detect` and friends.
pub trait LanguageDetector: Send + Sync {
    /// Match count per language, in declaration order, zeros included.
    fn scores(&self, text: &str) -> Vec<(&'static str, usize)>;

    fn detect(&self, text: &str) -> &'static str {
        let mut best: Option<(&'static str, usize)> = None;
        for (code, count) in self.scores(text) {
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((code, count));
            }
        }
        best.map_or(DEFAULT_LANGUAGE, |(code, _)| code)
    }

    /// Winner's share of all matches, in `[0, 1]`.
    fn confidence(&self, text: &str) -> f64 {
        let scores = self.scores(text);
        let total: usize = scores.iter().map(|(_, c)| c).sum();
        if total == 0 {
            return 0.0;
        }
        let best = scores.iter().map(|(_, c)| *c).max().unwrap_or(0);
        best as f64 / total as f64
    }

    fn top_languages(&self, text: &str, n: usize) -> Vec<(&'static str, usize)> {
        let mut scores: Vec<_> = self
            .scores(text)
            .into_iter()
            .filter(|(_, c)| *c > 0)
            .collect();
        // stable: equal counts keep declaration order
        scores.sort_by(|a, b| b.1.cmp(&a.1));
        scores.truncate(n);
        scores
    }

    fn is_likely(&self, text: &str, lang: &str) -> bool {
        self.detect(text) == lang
    }
}

/// Table-driven detector over precompiled script patterns.
pub struct ScriptDetector {
    patterns: Vec<(&'static str, Regex)>,
}

impl ScriptDetector {
    /// Detector over the built-in catalog patterns.
    pub fn builtin() -> Self {
        let patterns = SCRIPT_PATTERNS
            .iter()
            .filter_map(|(code, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((*code, re)),
                Err(e) => {
                    tracing::error!(code, error = %e, "invalid script pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn languages(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.patterns.iter().map(|(code, _)| *code)
    }
}

impl Default for ScriptDetector {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageDetector for ScriptDetector {
    fn scores(&self, text: &str) -> Vec<(&'static str, usize)> {
        self.patterns
            .iter()
            .map(|(code, re)| {
                let count = if text.is_empty() {
                    0
                } else {
                    re.find_iter(text).count()
                };
                (*code, count)
            })
            .collect()
    }
}

static DETECTOR: LazyLock<ScriptDetector> = LazyLock::new(ScriptDetector::builtin);

/// Most likely language code for `text`; `"en"` when nothing matches.
pub fn detect_language(text: &str) -> &'static str {
    DETECTOR.detect(text)
}

pub fn get_language_confidence(text: &str) -> f64 {
    DETECTOR.confidence(text)
}

pub fn get_top_languages(text: &str, n: usize) -> Vec<(&'static str, usize)> {
    DETECTOR.top_languages(text, n)
}

pub fn is_likely_language(text: &str, lang: &str) -> bool {
    DETECTOR.is_likely(text, lang)
}
