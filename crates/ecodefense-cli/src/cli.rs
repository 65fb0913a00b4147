//! CLI command definitions and argument parsing.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ecodefense_domain::{RegistrantField, VerbosityMode};
use std::path::PathBuf;

/// EcoDefense - answer environmental licence requirements from a knowledge base.
#[derive(Debug, Parser)]
#[command(name = "ecodefense")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ECODEFENSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Session file path
    #[arg(short, long, global = true, env = "ECODEFENSE_SESSION")]
    pub session: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (bare values)
    Quiet,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a licence PDF into the session
    Import(ImportArgs),

    /// Show or edit the registrant data
    Registrant(RegistrantArgs),

    /// Show or edit the pending requirements
    Queue(QueueArgs),

    /// Open a requirement in the editor
    Open(OpenArgs),

    /// Generate a response for the open requirement
    Generate(GenerateArgs),

    /// Generate another candidate for the open requirement
    Regenerate(GenerateArgs),

    /// Replace the response, or with --requirement the requirement text, by hand
    Edit(EditArgs),

    /// Show the open requirement and its response
    Draft,

    /// Approve the open response into the report
    Approve(ApproveArgs),

    /// Discard the open requirement
    Cancel,

    /// Show or edit the approved responses
    Report(ReportArgs),

    /// Set who signs the report
    Signer(SignerArgs),

    /// Render the report to PDF
    Render(RenderArgs),

    /// Build the knowledge base from a corpus directory
    Index(IndexArgs),

    /// List the documents in the knowledge base
    Sources,

    /// Show or reset the session
    Session(SessionArgs),

    /// Show or write the configuration
    Config(ConfigArgs),

    /// Enter interactive REPL mode
    Repl,
}

/// Arguments for the import command.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Licence PDF
    pub file: PathBuf,

    /// Read only the registrant block from the first pages and clear the queue
    #[arg(short, long)]
    pub registrant_only: bool,
}

/// Arguments for the registrant command.
#[derive(Debug, Args)]
pub struct RegistrantArgs {
    #[command(subcommand)]
    pub action: Option<RegistrantAction>,
}

/// Registrant actions.
#[derive(Debug, Subcommand)]
pub enum RegistrantAction {
    /// Show the registrant data
    Show,
    /// Set one field
    Set {
        /// company, tax_id, address or city
        #[arg(value_parser = parse_field)]
        field: RegistrantField,
        /// New value
        #[arg(num_args = 1..)]
        value: Vec<String>,
    },
}

/// Arguments for the queue command.
#[derive(Debug, Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub action: Option<QueueAction>,
}

/// Queue actions.
#[derive(Debug, Subcommand)]
pub enum QueueAction {
    /// List pending requirements
    List,
    /// Append a requirement by hand
    Add {
        /// Requirement text
        #[arg(num_args = 1..)]
        text: Vec<String>,
    },
    /// Remove a pending requirement
    Remove {
        /// Position, starting at 1
        index: usize,
    },
    /// Remove every pending requirement
    Clear,
}

/// Arguments for the open command.
#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Queue position, starting at 1
    #[arg(conflicts_with = "text", required_unless_present = "text")]
    pub index: Option<usize>,

    /// Free-form requirement instead of a queued one
    #[arg(short, long)]
    pub text: Option<String>,

    /// Verbosity mode for the draft
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<VerbosityMode>,
}

/// Arguments for the generate and regenerate commands.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Verbosity mode: terse, balanced or detailed (curta, media, avancada)
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<VerbosityMode>,
}

/// Arguments for the edit command.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Replace the requirement text instead of the response
    #[arg(short, long)]
    pub requirement: bool,

    /// New text
    #[arg(num_args = 1..)]
    pub text: Vec<String>,
}

/// Arguments for the approve command.
#[derive(Debug, Args)]
pub struct ApproveArgs {
    /// Item title; defaults to "Item N"
    #[arg(short, long)]
    pub title: Option<String>,
}

/// Arguments for the report command.
#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub action: Option<ReportAction>,
}

/// Report actions.
#[derive(Debug, Subcommand)]
pub enum ReportAction {
    /// List approved responses
    List,
    /// Remove an approved response
    Remove {
        /// Position, starting at 1
        index: usize,
    },
}

/// Arguments for the signer command.
#[derive(Debug, Args)]
pub struct SignerArgs {
    /// Signer name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Signer title
    #[arg(short, long)]
    pub title: Option<String>,
}

/// Arguments for the render command.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Output PDF; defaults to the configured directory
    pub output: Option<PathBuf>,

    /// Date printed by the signature (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the index command.
#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Directory of .pdf, .txt and .md files
    pub corpus: PathBuf,
}

/// Arguments for the session command.
#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: Option<SessionAction>,
}

/// Session actions.
#[derive(Debug, Subcommand)]
pub enum SessionAction {
    /// Summarise the session
    Show,
    /// Start over with an empty session
    Reset,
}

/// Arguments for the config command.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse a verbosity mode name or alias.
pub fn parse_mode(s: &str) -> Result<VerbosityMode, String> {
    s.parse()
}

/// Parse a registrant field name.
pub fn parse_field(s: &str) -> Result<RegistrantField, String> {
    RegistrantField::parse(s).ok_or_else(|| {
        format!("Unknown field '{}' (expected company, tax_id, address or city)", s)
    })
}
