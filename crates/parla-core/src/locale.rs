//! Locale bundles — UI copy and color keyword tables.
//!
//! The console ships exactly two bundles: Russian and a default English
//! one. Selection is by exact tag equality with `ru-RU`; every other tag
//! falls back to English, including other Russian variants like `ru` or
//! `ru-BY`.

use std::collections::HashMap;

/// The one tag that selects the Russian bundle.
pub const RUSSIAN_TAG: &str = "ru-RU";

/// Static UI copy plus the color keyword list for one language.
#[derive(Debug, Clone, Copy)]
pub struct LocaleBundle {
    /// Intro line above the synthesis form.
    pub synthesis_copy: &'static str,
    /// Intro line above the capture toggle.
    pub recognition_copy: &'static str,
    /// Prefix of the recognition-language line.
    pub language_label: &'static str,
    /// `(keyword, display color)` pairs, keywords lowercase.
    keywords: &'static [(&'static str, &'static str)],
}

pub static ENGLISH: LocaleBundle = LocaleBundle {
    synthesis_copy: "Voice synthesis. Type some text, choose voice and press play button",
    recognition_copy: "Speech recognition. Press the button and say something",
    language_label: "Recognition language: ",
    keywords: &[
        ("red", "red"),
        ("orange", "orange"),
        ("yellow", "yellow"),
        ("green", "green"),
        ("blue", "blue"),
    ],
};

pub static RUSSIAN: LocaleBundle = LocaleBundle {
    synthesis_copy: "Синтез речи. Введите текст, выберите \"актера\" и нажмите play",
    recognition_copy: "Распознавание речи. Нажмите на иконку микрофона и скажите что-нибудь",
    language_label: "Язык распознавания: ",
    // Both spellings of yellow and green are accepted (ё and е).
    keywords: &[
        ("красный", "red"),
        ("оранжевый", "orange"),
        ("желтый", "yellow"),
        ("жёлтый", "yellow"),
        ("зеленый", "green"),
        ("зелёный", "green"),
        ("синий", "blue"),
    ],
};

/// Select the bundle for a language tag.
pub fn select_bundle(tag: &str) -> &'static LocaleBundle {
    if tag == RUSSIAN_TAG {
        &RUSSIAN
    } else {
        &ENGLISH
    }
}

/// Normalize a POSIX locale string (`ru_RU.UTF-8`) to a BCP 47 language
/// tag (`ru-RU`). Already-formed tags pass through unchanged.
pub fn normalize_tag(raw: &str) -> String {
    let tag = raw.split(['.', '@']).next().unwrap_or(raw);
    tag.replace('_', "-")
}

impl LocaleBundle {
    /// The full recognition-language line for a tag. The tag is reported
    /// verbatim even when it differs from the bundle's own language.
    pub fn language_line(&self, tag: &str) -> String {
        format!("{}{}", self.language_label, tag)
    }

    /// Build the keyword lookup table for this bundle.
    pub fn keyword_table(&self) -> KeywordTable {
        KeywordTable {
            map: self.keywords.iter().copied().collect(),
        }
    }
}

/// Lowercase keyword → display color, for exactly one language.
///
/// Lookups fold case but never strip punctuation: `"Red"` matches,
/// `"red,"` does not.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    map: HashMap<&'static str, &'static str>,
}

impl KeywordTable {
    /// Display color for a word token, if it is a known keyword.
    pub fn color_for(&self, token: &str) -> Option<&'static str> {
        self.map.get(token.to_lowercase().as_str()).copied()
    }
}
