//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use ecodefense_domain::{Draft, RegistrantField, RegistrantRecord, Report, RequirementQueue, Session};
use ecodefense_extractor::{GeneratedResponse, ImportResult, IngestReport, PipelineWarning, RegistrantImport};
use ecodefense_store::SourceSummary;
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{
        object::{Rows, Segment},
        Alignment, Modify, Style, Width,
    },
};

/// Cells wider than this are wrapped
const CELL_WIDTH: usize = 72;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format registrant data.
    pub fn format_registrant(&self, record: &RegistrantRecord) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
            OutputFormat::Quiet => Ok(record.to_canonical()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                for field in RegistrantField::ALL {
                    let value = record.get(field);
                    let value = if value.is_empty() { "-" } else { value };
                    builder.push_record([field.label(), value]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format the pending requirements, numbered from 1.
    pub fn format_queue(&self, queue: &RequirementQueue) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(queue.as_slice())?),
            OutputFormat::Quiet => Ok(queue.as_slice().join("\n")),
            OutputFormat::Table => {
                if queue.is_empty() {
                    return Ok(self.colorize("No pending requirements.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["#", "Requirement"]);
                for (i, requirement) in queue.iter().enumerate() {
                    builder.push_record([(i + 1).to_string(), requirement.to_string()]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format the approved items, numbered from 1.
    pub fn format_report(&self, report: &Report) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => {
                let titles: Vec<&str> = report.items().iter().map(|i| i.title.as_str()).collect();
                Ok(titles.join("\n"))
            }
            OutputFormat::Table => {
                if report.is_empty() {
                    return Ok(self.colorize("No approved responses.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["#", "Title", "Requirement", "Response"]);
                for (i, item) in report.items().iter().enumerate() {
                    builder.push_record([
                        (i + 1).to_string(),
                        item.title.clone(),
                        item.requirement.clone(),
                        item.response.clone(),
                    ]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format the draft open in the editor.
    pub fn format_draft(&self, draft: &Draft) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(draft)?),
            OutputFormat::Quiet => Ok(draft.response.clone().unwrap_or_default()),
            OutputFormat::Table => {
                let origin = match draft.queue_index {
                    Some(i) => format!("queue #{}", i + 1),
                    None => "typed".to_string(),
                };
                let mut out = format!(
                    "{} {}\n{}\n\n",
                    self.colorize("Requirement", "cyan"),
                    self.colorize(&format!("({}, {})", origin, draft.mode), "magenta"),
                    draft.requirement
                );
                match &draft.response {
                    Some(response) => {
                        out.push_str(&self.colorize("Response", "cyan"));
                        out.push('\n');
                        out.push_str(response);
                    }
                    None => out.push_str(&self.colorize("No response yet.", "yellow")),
                }
                Ok(out)
            }
        }
    }

    /// Format a generated candidate.
    pub fn format_generated(&self, response: &GeneratedResponse) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(response)?),
            OutputFormat::Quiet => Ok(response.text.clone()),
            OutputFormat::Table => {
                let mut out = String::new();
                for warning in &response.warnings {
                    out.push_str(&self.warning(&warning.to_string()));
                    out.push('\n');
                }
                if !response.passages.is_empty() {
                    let sources: Vec<String> = response
                        .passages
                        .iter()
                        .map(|p| format!("{} ({:.2})", p.source, p.score))
                        .collect();
                    out.push_str(&self.info(&format!("Context: {}", sources.join(", "))));
                    out.push('\n');
                }
                out.push_str(&response.text);
                Ok(out)
            }
        }
    }

    /// Format the outcome of a full import.
    pub fn format_import(&self, import: &ImportResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(import)?),
            OutputFormat::Quiet => Ok(import.requirements.join("\n")),
            OutputFormat::Table => {
                let mut out = self.warnings(&import.warnings);
                out.push_str(&self.format_registrant(&import.registrant)?);
                out.push('\n');
                out.push_str(&self.format_queue(&RequirementQueue::from_requirements(
                    import.requirements.clone(),
                ))?);
                out.push('\n');
                out.push_str(&self.success(&format!(
                    "Imported {} requirement(s) from {} page(s) in {} ms",
                    import.requirements.len(),
                    import.metadata.pages_read,
                    import.metadata.processing_time_ms
                )));
                Ok(out)
            }
        }
    }

    /// Format the outcome of a registrant-only import.
    pub fn format_registrant_import(&self, import: &RegistrantImport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(import)?),
            OutputFormat::Quiet => Ok(import.registrant.to_canonical()),
            OutputFormat::Table => {
                let mut out = self.warnings(&import.warnings);
                out.push_str(&self.format_registrant(&import.registrant)?);
                out.push('\n');
                out.push_str(&self.success("Registrant imported; requirement queue cleared"));
                Ok(out)
            }
        }
    }

    /// Format the outcome of a knowledge base build.
    pub fn format_ingest(&self, report: &IngestReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let skipped: Vec<serde_json::Value> = report
                    .files_skipped
                    .iter()
                    .map(|(path, reason)| json!({ "path": path, "reason": reason }))
                    .collect();
                Ok(serde_json::to_string_pretty(&json!({
                    "files_indexed": report.files_indexed,
                    "chunks": report.chunks,
                    "files_skipped": skipped,
                }))?)
            }
            OutputFormat::Quiet => Ok(report.chunks.to_string()),
            OutputFormat::Table => {
                let mut out = String::new();
                for (path, reason) in &report.files_skipped {
                    out.push_str(&self.warning(&format!("Skipped {}: {}", path.display(), reason)));
                    out.push('\n');
                }
                out.push_str(&self.success(&format!(
                    "Indexed {} chunk(s) from {} file(s)",
                    report.chunks, report.files_indexed
                )));
                Ok(out)
            }
        }
    }

    /// Format the knowledge base contents.
    pub fn format_sources(&self, sources: &[SourceSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(sources)?),
            OutputFormat::Quiet => {
                let names: Vec<&str> = sources.iter().map(|s| s.source.as_str()).collect();
                Ok(names.join("\n"))
            }
            OutputFormat::Table => {
                if sources.is_empty() {
                    return Ok(self.colorize("Knowledge base is empty.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Source", "Chunks"]);
                for source in sources {
                    builder.push_record([source.source.clone(), source.chunks.to_string()]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format a session summary.
    pub fn format_session(&self, session: &Session) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(session)?),
            OutputFormat::Quiet => Ok(format!(
                "{} {}",
                session.queue.len(),
                session.report.len()
            )),
            OutputFormat::Table => {
                let draft = match &session.draft {
                    Some(d) if d.response.is_some() => "open, answered",
                    Some(_) => "open",
                    None => "none",
                };
                let company = if session.registrant.company.is_empty() {
                    "-"
                } else {
                    session.registrant.company.as_str()
                };

                let mut builder = Builder::default();
                builder.push_record(["Company", company]);
                builder.push_record(["Pending requirements", &session.queue.len().to_string()]);
                builder.push_record(["Approved responses", &session.report.len().to_string()]);
                builder.push_record(["Draft", draft]);
                builder.push_record([
                    "Signer",
                    &format!("{}, {}", session.signer_name, session.signer_title),
                ]);
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(table.to_string())
            }
        }
    }

    /// Format pipeline warnings, one per line.
    pub fn warnings(&self, warnings: &[PipelineWarning]) -> String {
        warnings
            .iter()
            .map(|w| format!("{}\n", self.warning(&w.to_string())))
            .collect()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Segment::all()).with(Width::wrap(CELL_WIDTH).keep_words(true)))
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}
