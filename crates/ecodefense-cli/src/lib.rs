//! EcoDefense CLI library.
//!
//! This library provides the core functionality for the EcoDefense command-line
//! interface: configuration, session persistence, command execution and
//! output formatting. The binary and the REPL are thin layers over it.

pub mod cli;
pub mod commands;
pub mod config;
pub mod desk;
pub mod error;
pub mod output;
pub mod repl;
pub mod session_file;

pub use cli::{Cli, Command};
pub use config::Config;
pub use desk::Desk;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use session_file::SessionFile;
