//! Language codes and the locale data derived from them.

/// Locale data for one configured language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 code as configured, e.g. "de".
    pub code: String,
    /// TMDB locale, e.g. "de-DE".
    pub tmdb_locale: &'static str,
    /// Region code for search and geo bypass, e.g. "DE".
    pub region: &'static str,
    /// Native name of the language, appended to trailer search queries.
    pub native_word: &'static str,
}

const KNOWN: &[(&str, &str, &str, &str)] = &[
    ("de", "de-DE", "DE", "Deutsch"),
    ("en", "en-US", "US", "English"),
    ("fr", "fr-FR", "FR", "Français"),
    ("it", "it-IT", "IT", "Italiano"),
    ("es", "es-ES", "ES", "Español"),
    ("nl", "nl-NL", "NL", "Nederlands"),
    ("pt", "pt-PT", "PT", "Português"),
    ("pl", "pl-PL", "PL", "Polski"),
    ("tr", "tr-TR", "TR", "Türkçe"),
    ("ru", "ru-RU", "RU", "Русский"),
];

const FALLBACK: (&str, &str, &str) = ("en-US", "US", "English");

impl Language {
    /// Resolves a language code. Unknown codes keep their code but use
    /// English locale data.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_lowercase();
        let (tmdb_locale, region, native_word) = KNOWN
            .iter()
            .find(|(c, ..)| *c == code)
            .map(|&(_, locale, region, word)| (locale, region, word))
            .unwrap_or(FALLBACK);

        Self {
            code,
            tmdb_locale,
            region,
            native_word,
        }
    }

    /// Whether the code is one of the built-in languages.
    pub fn is_known(&self) -> bool {
        KNOWN.iter().any(|(c, ..)| *c == self.code)
    }
}
