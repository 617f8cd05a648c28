//! Translation direction and per-language text
//!
//! A conversation runs in one of two directions: `Forward` treats Spanish as
//! the spoken language and English as the translation target, `Reverse` swaps
//! the two. The recognizer language code, the translation instruction, and
//! the localized chat markers are all derived here so the mapping stays
//! symmetric.

use serde::{Deserialize, Serialize};

/// Direction token the browser client sends for Spanish-to-English
pub const TOKEN_FORWARD: &str = "es-en";

/// Direction token the browser client sends for English-to-Spanish
pub const TOKEN_REVERSE: &str = "en-es";

/// Which language is spoken-source vs translation-target for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Spanish spoken, translated to English
    #[default]
    Forward,
    /// English spoken, translated to Spanish
    Reverse,
}

impl Direction {
    /// Parse a wire token, defaulting to forward for anything unrecognized
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case(TOKEN_REVERSE) {
            Self::Reverse
        } else {
            Self::Forward
        }
    }

    /// Wire token for this direction
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Forward => TOKEN_FORWARD,
            Self::Reverse => TOKEN_REVERSE,
        }
    }

    /// The opposite direction
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// BCP-47 language code the recognizer should use for the spoken audio
    #[must_use]
    pub const fn source_language_code(self) -> &'static str {
        match self {
            Self::Forward => "es-ES",
            Self::Reverse => "en-US",
        }
    }

    /// Fixed system instruction for the translation provider
    #[must_use]
    pub const fn translation_instruction(self) -> &'static str {
        match self {
            Self::Forward => {
                "You are a helpful assistant that translates Spanish to English. \
                 You only translate the words, you don't respond or add any other text."
            }
            Self::Reverse => {
                "You are a helpful assistant that translates English to Spanish. \
                 You only translate the words, you don't respond or add any other text."
            }
        }
    }

    /// Greeting shown as the first system turn of a fresh session
    #[must_use]
    pub const fn greeting(self) -> &'static str {
        match self {
            Self::Forward => "\u{a1}Hola! Pulsa el micr\u{f3}fono y habla en espa\u{f1}ol.",
            Self::Reverse => "Hi! Press the microphone and speak in English.",
        }
    }

    /// Placeholder text shown while a clip is being transcribed
    #[must_use]
    pub const fn transcribing_placeholder(self) -> &'static str {
        match self {
            Self::Forward => "[Audio enviado, transcribiendo...]",
            Self::Reverse => "[Audio sent, transcribing...]",
        }
    }

    /// Marker shown when no usable speech was recognized
    #[must_use]
    pub const fn not_transcribed_marker(self) -> &'static str {
        match self {
            Self::Forward => "[No se pudo transcribir]",
            Self::Reverse => "[Could not transcribe]",
        }
    }

    /// Human-readable name of the spoken language
    #[must_use]
    pub const fn spoken_language(self) -> &'static str {
        match self {
            Self::Forward => "Spanish",
            Self::Reverse => "English",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}
