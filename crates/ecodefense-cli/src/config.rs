//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use ecodefense_domain::report::{DEFAULT_SIGNER_NAME, DEFAULT_SIGNER_TITLE};
use ecodefense_extractor::ExtractorConfig;
use ecodefense_llm::ProviderSettings;
use ecodefense_report::DEFAULT_REPORT_TITLE;
use ecodefense_store::EmbeddingSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".ecodefense";
const CONFIG_FILE: &str = "config.toml";
const KNOWLEDGE_FILE: &str = "knowledge.db";
const SESSION_FILE: &str = "session.json";
const HISTORY_FILE: &str = "history.txt";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Language model provider
    #[serde(default)]
    pub llm: ProviderSettings,

    /// Embedding model used to build and query the knowledge base
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Knowledge base location
    #[serde(default)]
    pub knowledge: KnowledgeSettings,

    /// Pipeline limits and thresholds
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Default signer for new sessions
    #[serde(default)]
    pub signature: SignatureSettings,

    /// Report output
    #[serde(default)]
    pub output: OutputSettings,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Where the knowledge base lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    /// SQLite file; defaults to `~/.ecodefense/knowledge.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// Signer printed under new reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSettings {
    /// Signer name
    #[serde(default = "default_signer_name")]
    pub name: String,

    /// Signer title
    #[serde(default = "default_signer_title")]
    pub title: String,
}

/// Report rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Heading printed under the company name
    #[serde(default = "default_report_title")]
    pub report_title: String,

    /// Directory for reports rendered without an explicit path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Command history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the config, the default knowledge base and the session.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(CONFIG_DIR))
    }

    /// Get the configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join(CONFIG_FILE))
    }

    /// Default session file path.
    pub fn default_session_path() -> Result<PathBuf> {
        Ok(Self::dir()?.join(SESSION_FILE))
    }

    /// REPL history file path.
    pub fn history_path() -> Result<PathBuf> {
        Ok(Self::dir()?.join(HISTORY_FILE))
    }

    /// Load configuration from the default file or create default.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`; a missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate().map_err(CliError::Config)?;
        if self.llm.model.trim().is_empty() {
            return Err(CliError::Config("llm.model must not be empty".into()));
        }
        if self.llm.max_attempts == 0 {
            return Err(CliError::Config("llm.max_attempts must be at least 1".into()));
        }
        let worst_case = self.llm.worst_case_call();
        if self.extractor.model_timeout() < worst_case {
            return Err(CliError::Config(format!(
                "extractor.model_timeout_secs ({}) must cover every llm attempt: {} attempts of {}s plus backoff need {}s",
                self.extractor.model_timeout_secs,
                self.llm.max_attempts,
                self.llm.timeout_secs,
                worst_case.as_secs()
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(CliError::Config("embedding.dimension must be positive".into()));
        }
        Ok(())
    }

    /// Knowledge base file, resolved against the config directory.
    pub fn knowledge_db_path(&self) -> Result<PathBuf> {
        match &self.knowledge.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::dir()?.join(KNOWLEDGE_FILE)),
        }
    }
}

impl Default for SignatureSettings {
    fn default() -> Self {
        Self {
            name: default_signer_name(),
            title: default_signer_title(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            report_title: default_report_title(),
            directory: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
        }
    }
}

fn default_signer_name() -> String {
    DEFAULT_SIGNER_NAME.to_string()
}

fn default_signer_title() -> String {
    DEFAULT_SIGNER_TITLE.to_string()
}

fn default_report_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}
