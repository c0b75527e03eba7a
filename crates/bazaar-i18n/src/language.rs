//! Supported-language catalog.
//!
//! Order matters: language detection breaks ties in favour of the entry
//! declared first.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: &'static str,
    pub display_name: &'static str,
    pub native_name: &'static str,
    pub flag: &'static str,
}

const fn lang(
    code: &'static str,
    display_name: &'static str,
    native_name: &'static str,
    flag: &'static str,
) -> Language {
    Language {
        code,
        display_name,
        native_name,
        flag,
    }
}

pub const LANGUAGES: &[Language] = &[
    lang("en", "English", "English", "🇬🇧"),
    lang("hi", "Hindi", "हिन्दी", "🇮🇳"),
    lang("bn", "Bengali", "বাংলা", "🇧🇩"),
    lang("te", "Telugu", "తెలుగు", "🇮🇳"),
    lang("mr", "Marathi", "मराठी", "🇮🇳"),
    lang("ta", "Tamil", "தமிழ்", "🇮🇳"),
    lang("gu", "Gujarati", "ગુજરાતી", "🇮🇳"),
    lang("kn", "Kannada", "ಕನ್ನಡ", "🇮🇳"),
    lang("ml", "Malayalam", "മലയാളം", "🇮🇳"),
    lang("pa", "Punjabi", "ਪੰਜਾਬੀ", "🇮🇳"),
    lang("ar", "Arabic", "العربية", "🇸🇦"),
    lang("ur", "Urdu", "اردو", "🇵🇰"),
    lang("es", "Spanish", "Español", "🇪🇸"),
    lang("fr", "French", "Français", "🇫🇷"),
    lang("de", "German", "Deutsch", "🇩🇪"),
    lang("pt", "Portuguese", "Português", "🇵🇹"),
    lang("ru", "Russian", "Русский", "🇷🇺"),
    lang("zh", "Chinese", "中文", "🇨🇳"),
    lang("ja", "Japanese", "日本語", "🇯🇵"),
    lang("ko", "Korean", "한국어", "🇰🇷"),
];

pub fn find_language(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

pub fn is_supported(code: &str) -> bool {
    find_language(code).is_some()
}
