//! Session persistence between one-shot commands.

use crate::config::Config;
use crate::error::Result;
use ecodefense_domain::Session;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A session saved as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Session file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Session file given on the command line, or the default one.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::new(path)),
            None => Ok(Self::new(Config::default_session_path()?)),
        }
    }

    /// Where the session lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session, or start one signed by the configured signer.
    pub fn load(&self, config: &Config) -> Result<Session> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No saved session, starting a new one");
            return Ok(new_session(config));
        }

        let contents = fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&contents)?;
        debug!(
            path = %self.path.display(),
            queue = session.queue.len(),
            report = session.report.len(),
            "Loaded session"
        );
        Ok(session)
    }

    /// Write the session, replacing the previous file only once the new one is complete.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(session)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// Delete the saved session; a missing file is not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A fresh session carrying the configured signer.
pub fn new_session(config: &Config) -> Session {
    let mut session = Session::new();
    session.signer_name = config.signature.name.clone();
    session.signer_title = config.signature.title.clone();
    session
}
