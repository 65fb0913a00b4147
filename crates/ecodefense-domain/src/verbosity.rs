//! Verbosity module - response length and tone presets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Preset controlling how long and how technical a generated response is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityMode {
    /// One short paragraph confirming compliance
    Terse,

    /// About two paragraphs: confirmation plus a brief technical rationale
    #[default]
    Balanced,

    /// Three to four paragraphs of full technical justification
    Detailed,
}

impl VerbosityMode {
    /// All modes, shortest first
    pub const ALL: [VerbosityMode; 3] = [
        VerbosityMode::Terse,
        VerbosityMode::Balanced,
        VerbosityMode::Detailed,
    ];

    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            VerbosityMode::Terse => "terse",
            VerbosityMode::Balanced => "balanced",
            VerbosityMode::Detailed => "detailed",
        }
    }

    /// Parse a mode from its name or the Portuguese alias
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "terse" | "short" | "curta" => Some(VerbosityMode::Terse),
            "balanced" | "medium" | "media" | "média" => Some(VerbosityMode::Balanced),
            "detailed" | "advanced" | "avancada" | "avançada" => Some(VerbosityMode::Detailed),
            _ => None,
        }
    }
}

impl fmt::Display for VerbosityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VerbosityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("Unknown verbosity mode '{}' (expected terse, balanced or detailed)", s)
        })
    }
}
