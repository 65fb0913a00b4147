//! Result and warning types returned by the pipeline

use ecodefense_domain::{Passage, RegistrantField, RegistrantRecord, VerbosityMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal problems reported next to a (possibly partial) result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// Registrant output lacked some labels; those fields stay empty
    MalformedRegistrant {
        /// Fields that were not found
        missing: Vec<RegistrantField>,
    },

    /// Requirement output had no delimiter; it was split on line breaks
    RequirementsLineFallback,

    /// Requirement output yielded no requirement
    NoRequirements,

    /// Pages whose text could not be extracted
    PagesSkipped {
        /// 1-based page numbers
        pages: Vec<u32>,
    },

    /// Knowledge base missing, empty or failing; generation used no context
    RetrievalUnavailable {
        /// What went wrong
        reason: String,
    },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::MalformedRegistrant { missing } => {
                let labels: Vec<&str> = missing.iter().map(|m| m.label()).collect();
                write!(
                    f,
                    "Registrant data incomplete, missing: {}",
                    labels.join(", ")
                )
            }
            PipelineWarning::RequirementsLineFallback => write!(
                f,
                "The model did not separate requirements with the delimiter; split on line breaks instead, review the queue"
            ),
            PipelineWarning::NoRequirements => {
                write!(f, "No requirements were found in the document")
            }
            PipelineWarning::PagesSkipped { pages } => {
                let pages: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
                write!(f, "Text could not be read from page(s) {}", pages.join(", "))
            }
            PipelineWarning::RetrievalUnavailable { reason } => {
                write!(f, "Knowledge base unavailable ({}); response generated without context", reason)
            }
        }
    }
}

/// Facts about one import, for display and logging
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportMetadata {
    /// Pages in the document
    pub page_count: usize,

    /// Pages that were read (after the page limit)
    pub pages_read: usize,

    /// Characters of extracted text
    pub text_chars: usize,

    /// Model calls issued
    pub model_calls: usize,

    /// Model that answered
    pub model_name: String,

    /// Wall-clock time
    pub processing_time_ms: u64,
}

/// Result of a full import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    /// Registrant data parsed from the model output
    pub registrant: RegistrantRecord,

    /// Requirements in document order
    pub requirements: Vec<String>,

    /// Non-fatal problems
    pub warnings: Vec<PipelineWarning>,

    /// Import facts
    pub metadata: ImportMetadata,
}

/// Result of a registrant-only import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrantImport {
    /// Registrant data parsed from the model output
    pub registrant: RegistrantRecord,

    /// Non-fatal problems
    pub warnings: Vec<PipelineWarning>,

    /// Import facts
    pub metadata: ImportMetadata,
}

/// A generated response candidate
///
/// Regeneration produces a new value and leaves the previous one untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResponse {
    /// Response text
    pub text: String,

    /// Requirement it answers
    pub requirement: String,

    /// Context string the prompt was built with (passages joined by newlines)
    pub context: String,

    /// Passages behind the context
    pub passages: Vec<Passage>,

    /// Verbosity mode
    pub mode: VerbosityMode,

    /// Sampling temperature used
    pub temperature: f32,

    /// Non-fatal problems
    pub warnings: Vec<PipelineWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages() {
        let warning = PipelineWarning::MalformedRegistrant {
            missing: vec![RegistrantField::TaxId, RegistrantField::City],
        };
        assert_eq!(
            warning.to_string(),
            "Registrant data incomplete, missing: TAX_ID, CITY"
        );

        let warning = PipelineWarning::PagesSkipped { pages: vec![2, 5] };
        assert_eq!(warning.to_string(), "Text could not be read from page(s) 2, 5");
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let json = serde_json::to_value(PipelineWarning::RequirementsLineFallback).unwrap();
        assert_eq!(json["kind"], "requirements_line_fallback");
    }
}
