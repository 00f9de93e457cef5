//! Target languages accepted by the summarization backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unsupported language: {0} (expected one of en, fr, es, af, zu)")]
pub struct UnknownLanguage(pub String);

/// Language the summary (and its narration) is produced in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    Es,
    Af,
    Zu,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Fr,
        Language::Es,
        Language::Af,
        Language::Zu,
    ];

    /// Short code sent on the wire
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::Af => "af",
            Language::Zu => "zu",
        }
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "French",
            Language::Es => "Spanish",
            Language::Af => "Afrikaans",
            Language::Zu => "Zulu",
        }
    }

    /// The next language in display order, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| {
                l.code().eq_ignore_ascii_case(needle) || l.name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}
