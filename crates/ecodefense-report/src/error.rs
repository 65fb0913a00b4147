//! Error types for report rendering

use thiserror::Error;

/// Errors that can occur while rendering a report
#[derive(Error, Debug)]
pub enum ReportError {
    /// Nothing was approved, so there is nothing to render
    #[error("The report has no approved items")]
    EmptyReport,

    /// The PDF document could not be assembled or serialised
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// Writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for ReportError {
    fn from(e: lopdf::Error) -> Self {
        ReportError::Pdf(e.to_string())
    }
}
