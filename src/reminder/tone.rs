//! Reminder phrasing styles.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Caller-selected style steering the generated reminder's phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Polite,
    Strict,
    Funny,
    Short,
    Professional,
    Friendly,
    Urgent,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Polite => "Polite",
            Self::Strict => "Strict",
            Self::Funny => "Funny",
            Self::Short => "Short",
            Self::Professional => "Professional",
            Self::Friendly => "Friendly",
            Self::Urgent => "Urgent",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "polite" => Some(Self::Polite),
            "strict" => Some(Self::Strict),
            "funny" => Some(Self::Funny),
            "short" => Some(Self::Short),
            "professional" => Some(Self::Professional),
            "friendly" => Some(Self::Friendly),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}
