//! Queue command implementation.

use crate::cli::{QueueAction, QueueArgs};
use crate::commands::{join_text, to_index};
use crate::error::Result;
use crate::output::Formatter;
use ecodefense_domain::{Session, SessionError};

/// Execute the queue command.
pub fn execute_queue(args: QueueArgs, session: &mut Session, formatter: &Formatter) -> Result<()> {
    match args.action.unwrap_or(QueueAction::List) {
        QueueAction::List => {
            println!("{}", formatter.format_queue(&session.queue)?);
        }
        QueueAction::Add { text } => {
            let text = join_text(&text, "Requirement")?;
            session.queue.push(text);
            println!(
                "{}",
                formatter.success(&format!("Added as #{}", session.queue.len()))
            );
        }
        QueueAction::Remove { index } => {
            let i = to_index(index)?;
            let len = session.queue.len();
            let removed = session
                .queue
                .remove(i)
                .ok_or(SessionError::QueueIndexOutOfRange { index, len })?;
            println!("{}", formatter.success(&format!("Removed: {}", removed)));
        }
        QueueAction::Clear => {
            let count = session.queue.len();
            session.replace_queue(Vec::new());
            println!(
                "{}",
                formatter.success(&format!("Removed {} requirement(s)", count))
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    fn session() -> Session {
        let mut session = Session::new();
        session.replace_queue(vec![
            "Apresentar relatório de automonitoramento".to_string(),
            "Manter licença afixada na portaria".to_string(),
            "Comunicar acidentes ambientais em 24 horas".to_string(),
        ]);
        session
    }

    fn run(action: QueueAction, session: &mut Session) -> Result<()> {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        execute_queue(QueueArgs { action: Some(action) }, session, &formatter)
    }

    #[test]
    fn test_remove_uses_positions_from_one() {
        let mut session = session();
        run(QueueAction::Remove { index: 2 }, &mut session).unwrap();

        assert_eq!(
            session.queue.as_slice(),
            [
                "Apresentar relatório de automonitoramento".to_string(),
                "Comunicar acidentes ambientais em 24 horas".to_string(),
            ]
        );
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut session = session();
        assert!(run(QueueAction::Remove { index: 4 }, &mut session).is_err());
        assert!(run(QueueAction::Remove { index: 0 }, &mut session).is_err());
        assert_eq!(session.queue.len(), 3);
    }

    #[test]
    fn test_add_and_clear() {
        let mut session = session();
        run(
            QueueAction::Add {
                text: vec!["Instalar".to_string(), "hidrômetro".to_string()],
            },
            &mut session,
        )
        .unwrap();
        assert_eq!(session.queue.get(3), Some("Instalar hidrômetro"));

        session.open_draft(0).unwrap();
        run(QueueAction::Clear, &mut session).unwrap();
        assert!(session.queue.is_empty());
        assert!(session.draft.is_none());
    }
}
