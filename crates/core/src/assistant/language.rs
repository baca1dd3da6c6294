//! Script-based locale detection.

use serde::{Deserialize, Serialize};

/// Response locale. Selects prompt and canned-message templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }
}

/// Arabic block.
const ARABIC_RANGE: std::ops::RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

/// Classify `text` by script: any Arabic code point selects [`Locale::Ar`].
pub fn detect_locale(text: &str) -> Locale {
    if text.chars().any(|c| ARABIC_RANGE.contains(&c)) {
        Locale::Ar
    } else {
        Locale::En
    }
}
