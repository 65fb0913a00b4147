//! Requirement splitting of model output

use serde::{Deserialize, Serialize};

/// Default separator between requirements in model output
pub const DEFAULT_DELIMITER: &str = "###";

/// Default minimum requirement length (requirements must be longer)
pub const DEFAULT_MIN_LENGTH: usize = 10;

/// How the text was split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// The delimiter was present and the text was split on it
    Delimiter,
    /// No delimiter; the text was split on line breaks
    LineFallback,
}

/// Requirements plus the strategy that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    /// Requirements in text order
    pub requirements: Vec<String>,

    /// Strategy used
    pub strategy: SplitStrategy,
}

/// Splits free text into discrete requirement strings
#[derive(Debug, Clone)]
pub struct RequirementSplitter {
    delimiter: String,
    min_length: usize,
}

impl Default for RequirementSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER, DEFAULT_MIN_LENGTH)
    }
}

impl RequirementSplitter {
    /// Create a splitter with a delimiter and minimum length
    pub fn new(delimiter: impl Into<String>, min_length: usize) -> Self {
        Self {
            delimiter: delimiter.into(),
            min_length,
        }
    }

    /// Override the minimum length
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Override the delimiter
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Delimiter in use
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Split `text` into requirements
    ///
    /// If the delimiter appears anywhere the text is split strictly on it;
    /// otherwise on line breaks. Fragments are trimmed and kept only when
    /// longer than the minimum length (in characters).
    pub fn split(&self, text: &str) -> SplitOutcome {
        let (fragments, strategy): (Vec<&str>, _) =
            if !self.delimiter.is_empty() && text.contains(self.delimiter.as_str()) {
                (
                    text.split(self.delimiter.as_str()).collect(),
                    SplitStrategy::Delimiter,
                )
            } else {
                (text.lines().collect(), SplitStrategy::LineFallback)
            };

        let requirements = fragments
            .into_iter()
            .map(str::trim)
            .filter(|f| !f.is_empty() && f.chars().count() > self.min_length)
            .map(str::to_string)
            .collect();

        SplitOutcome {
            requirements,
            strategy,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_every_requirement_is_trimmed_and_long_enough(
            text in "[a-zA-Z #\n]{0,200}",
            min_length in 0usize..20,
        ) {
            let outcome = RequirementSplitter::default()
                .with_min_length(min_length)
                .split(&text);
            for requirement in &outcome.requirements {
                prop_assert_eq!(requirement.trim(), requirement.as_str());
                prop_assert!(requirement.chars().count() > min_length);
            }
        }
    }
}
