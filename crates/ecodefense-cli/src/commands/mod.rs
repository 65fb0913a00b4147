//! Command implementations.
//!
//! Every command takes the session by `&mut` and leaves saving it to the
//! caller, so one-shot invocations and the REPL share the same code.

pub mod draft;
pub mod import;
pub mod knowledge;
pub mod queue;
pub mod registrant;
pub mod report;
pub mod session;

pub use self::draft::{
    execute_approve, execute_cancel, execute_edit, execute_generate, execute_open,
    execute_regenerate, execute_show_draft,
};
pub use self::import::execute_import;
pub use self::knowledge::{execute_index, execute_sources};
pub use self::queue::execute_queue;
pub use self::registrant::execute_registrant;
pub use self::report::{execute_render, execute_report, execute_signer};
pub use self::session::{execute_config, execute_session};

use crate::cli::Command;
use crate::desk::Desk;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use ecodefense_domain::Session;

/// Run one command against `session`.
pub fn execute(
    command: Command,
    desk: &mut Desk,
    session: &mut Session,
    formatter: &Formatter,
) -> Result<()> {
    match command {
        Command::Import(args) => execute_import(args, desk, session, formatter),
        Command::Registrant(args) => execute_registrant(args, session, formatter),
        Command::Queue(args) => execute_queue(args, session, formatter),
        Command::Open(args) => execute_open(args, session, formatter),
        Command::Generate(args) => execute_generate(args, desk, session, formatter),
        Command::Regenerate(args) => execute_regenerate(args, desk, session, formatter),
        Command::Edit(args) => execute_edit(args, session, formatter),
        Command::Draft => execute_show_draft(session, formatter),
        Command::Approve(args) => execute_approve(args, session, formatter),
        Command::Cancel => execute_cancel(session, formatter),
        Command::Report(args) => execute_report(args, session, formatter),
        Command::Signer(args) => execute_signer(args, session, formatter),
        Command::Render(args) => execute_render(args, desk, session, formatter),
        Command::Index(args) => execute_index(args, desk, formatter),
        Command::Sources => execute_sources(desk, formatter),
        Command::Session(args) => execute_session(args, desk, session, formatter),
        Command::Config(args) => execute_config(args, desk, formatter),
        Command::Repl => Err(CliError::InvalidInput(
            "Already in interactive mode".to_string(),
        )),
    }
}

/// Convert a position shown to the operator (from 1) into an index.
pub fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| CliError::InvalidInput("Positions start at 1".to_string()))
}

/// Join words given on the command line, rejecting empty text.
pub fn join_text(words: &[String], what: &str) -> Result<String> {
    let text = words.join(" ").trim().to_string();
    if text.is_empty() {
        return Err(CliError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(1).unwrap(), 0);
        assert_eq!(to_index(4).unwrap(), 3);
        assert!(matches!(to_index(0), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_join_text() {
        let words = vec!["Rua".to_string(), "das".to_string(), "Flores".to_string()];
        assert_eq!(join_text(&words, "Value").unwrap(), "Rua das Flores");
        assert!(join_text(&[" ".to_string()], "Value").is_err());
        assert!(join_text(&[], "Value").is_err());
    }
}
