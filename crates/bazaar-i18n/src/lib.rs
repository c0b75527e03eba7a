//! bazaar-i18n: best-effort localization for chat text
//!
//! ```text
//! translate(text, sl, tl)
//!   ├── sl == tl / blank text ──────────────► text (no network)
//!   ├── TranslationCache hit ───────────────► cached (no network)
//!   └── miss → Semaphore permit → backend GET → join segments → cache → text
//!                                       └── any failure ──► original text (Fallback)
//! ```
//!
//! Language detection is a table-driven script heuristic behind the
//! [`LanguageDetector`] trait.

pub mod backend;
pub mod cache;
pub mod detect;
pub mod engine;
pub mod error;
pub mod language;

pub use backend::{HttpTranslator, TranslateRequest, TranslationBackend};
pub use cache::{CacheStats, TranslationCache};
pub use detect::{
    detect_language, get_language_confidence, get_top_languages, is_likely_language,
    LanguageDetector, ScriptDetector,
};
pub use engine::{TranslationEngine, TranslationOutcome, PLACEHOLDER_CONFIDENCE};
pub use error::TranslateError;
pub use language::{find_language, Language, LANGUAGES};
