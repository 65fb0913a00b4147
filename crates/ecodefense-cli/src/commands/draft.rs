//! Draft command implementations: open, generate, edit, approve.

use crate::cli::{ApproveArgs, EditArgs, GenerateArgs, OpenArgs};
use crate::commands::{join_text, to_index};
use crate::desk::Desk;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use ecodefense_domain::{Session, SessionError};
use ecodefense_extractor::{GeneratedResponse, PipelineWarning};
use tracing::info;

/// Execute the open command.
pub fn execute_open(args: OpenArgs, session: &mut Session, formatter: &Formatter) -> Result<()> {
    match (args.index, args.text) {
        (Some(position), _) => {
            let index = to_index(position)?;
            if index >= session.queue.len() {
                return Err(SessionError::QueueIndexOutOfRange {
                    index: position,
                    len: session.queue.len(),
                }
                .into());
            }
            session.open_draft(index)?;
        }
        (None, Some(text)) => {
            let text = join_text(&[text], "Requirement")?;
            session.open_manual_draft(text);
        }
        (None, None) => {
            return Err(CliError::InvalidInput(
                "Give a queue position or --text".to_string(),
            ))
        }
    }

    let draft = session.draft_mut()?;
    if let Some(mode) = args.mode {
        draft.mode = mode;
    }
    println!("{}", formatter.format_draft(draft)?);
    Ok(())
}

/// Execute the generate command.
///
/// Retrieves context for the open requirement and stores the deterministic
/// response in the draft.
pub fn execute_generate(
    args: GenerateArgs,
    desk: &mut Desk,
    session: &mut Session,
    formatter: &Formatter,
) -> Result<()> {
    let draft = session.draft_mut()?;
    if let Some(mode) = args.mode {
        draft.mode = mode;
    }
    let (requirement, mode) = (draft.requirement.clone(), draft.mode);

    let generator = desk.generator()?;
    let response = desk.block_on(generator.generate(&requirement, mode))?;
    keep_response(session, &response)?;

    println!("{}", formatter.format_generated(&response)?);
    Ok(())
}

/// Execute the regenerate command.
///
/// Samples a new candidate for the same requirement and context; the draft
/// keeps only the newest candidate.
pub fn execute_regenerate(
    args: GenerateArgs,
    desk: &mut Desk,
    session: &mut Session,
    formatter: &Formatter,
) -> Result<()> {
    let draft = session.draft_mut()?;
    if let Some(mode) = args.mode {
        draft.mode = mode;
    }

    let (Some(text), Some(context)) = (draft.response.clone(), draft.context.clone()) else {
        return Err(CliError::InvalidInput(
            "Nothing to regenerate; run generate first".to_string(),
        ));
    };
    let previous = GeneratedResponse {
        text,
        requirement: draft.requirement.clone(),
        context,
        passages: draft.passages.clone(),
        mode: draft.mode,
        temperature: 0.0,
        warnings: draft
            .retrieval_unavailable
            .clone()
            .map(|reason| PipelineWarning::RetrievalUnavailable { reason })
            .into_iter()
            .collect(),
    };

    let generator = desk.generator()?;
    let response = desk.block_on(generator.regenerate(&previous))?;
    keep_response(session, &response)?;

    println!("{}", formatter.format_generated(&response)?);
    Ok(())
}

/// Store a candidate in the draft along with the sources and retrieval
/// outcome it was generated from.
fn keep_response(session: &mut Session, response: &GeneratedResponse) -> Result<()> {
    session.set_draft_response(response.text.clone(), response.context.clone())?;
    let draft = session.draft_mut()?;
    draft.passages = response.passages.clone();
    draft.retrieval_unavailable = response.warnings.iter().find_map(|w| match w {
        PipelineWarning::RetrievalUnavailable { reason } => Some(reason.clone()),
        _ => None,
    });
    Ok(())
}

/// Execute the edit command.
///
/// Replaces the response, or the requirement text with `--requirement`.
/// An edited requirement still consumes its original queue entry on approval.
pub fn execute_edit(args: EditArgs, session: &mut Session, formatter: &Formatter) -> Result<()> {
    let label = if args.requirement { "Requirement" } else { "Response" };
    let text = join_text(&args.text, label)?;
    let draft = session.draft_mut()?;
    if args.requirement {
        draft.requirement = text;
    } else {
        draft.response = Some(text);
    }
    println!("{}", formatter.success(&format!("{} updated", label)));
    Ok(())
}

/// Execute the draft command.
pub fn execute_show_draft(session: &Session, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_draft(session.draft()?)?);
    Ok(())
}

/// Execute the approve command.
pub fn execute_approve(
    args: ApproveArgs,
    session: &mut Session,
    formatter: &Formatter,
) -> Result<()> {
    let title = args
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let position = session.approve_draft(title.as_deref())?;
    let item = &session.report.items()[position];

    info!(title = %item.title, position, "Approved response");
    println!(
        "{}",
        formatter.success(&format!(
            "Approved '{}' ({} in report, {} pending)",
            item.title,
            session.report.len(),
            session.queue.len()
        ))
    );
    Ok(())
}

/// Execute the cancel command.
pub fn execute_cancel(session: &mut Session, formatter: &Formatter) -> Result<()> {
    match session.cancel_draft() {
        Some(_) => println!("{}", formatter.success("Draft discarded")),
        None => println!("{}", formatter.info("No draft was open")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, OutputFormat};
    use ecodefense_domain::VerbosityMode;
    use ecodefense_llm::{MockProvider, Provider};
    use ecodefense_store::EmbeddingSettings;
    use tempfile::TempDir;

    fn quiet() -> Formatter {
        Formatter::new(OutputFormat::Quiet, false)
    }

    fn desk(dir: &TempDir, llm: &MockProvider) -> Desk {
        let mut config = Config::default();
        config.knowledge.db_path = Some(dir.path().join("absent.db"));
        config.embedding = EmbeddingSettings::offline(384);
        Desk::new(config)
            .unwrap()
            .with_provider(Provider::Mock(llm.clone()))
    }

    fn session() -> Session {
        let mut session = Session::new();
        session.replace_queue(vec![
            "Apresentar inventário de resíduos sólidos".to_string(),
            "Realizar monitoramento de ruído anual".to_string(),
        ]);
        session
    }

    fn open(position: usize, session: &mut Session) {
        execute_open(
            OpenArgs {
                index: Some(position),
                text: None,
                mode: None,
            },
            session,
            &quiet(),
        )
        .unwrap();
    }

    #[test]
    fn test_open_queued_and_manual() {
        let mut session = session();
        open(2, &mut session);
        let draft = session.draft().unwrap();
        assert_eq!(draft.requirement, "Realizar monitoramento de ruído anual");
        assert_eq!(draft.queue_index, Some(1));

        execute_open(
            OpenArgs {
                index: None,
                text: Some("Plano de emergência atualizado".to_string()),
                mode: Some(VerbosityMode::Detailed),
            },
            &mut session,
            &quiet(),
        )
        .unwrap();
        let draft = session.draft().unwrap();
        assert_eq!(draft.queue_index, None);
        assert_eq!(draft.mode, VerbosityMode::Detailed);
    }

    #[test]
    fn test_open_out_of_range() {
        let mut session = session();
        let result = execute_open(
            OpenArgs {
                index: Some(3),
                text: None,
                mode: None,
            },
            &mut session,
            &quiet(),
        );
        assert!(matches!(
            result,
            Err(CliError::Session(SessionError::QueueIndexOutOfRange { index: 3, len: 2 }))
        ));
        assert!(session.draft.is_none());
    }

    #[test]
    fn test_generate_then_approve() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::new("O inventário é entregue anualmente.");
        let mut desk = desk(&dir, &llm);
        let mut session = session();

        open(1, &mut session);
        execute_generate(
            GenerateArgs {
                mode: Some(VerbosityMode::Terse),
            },
            &mut desk,
            &mut session,
            &quiet(),
        )
        .unwrap();

        let draft = session.draft().unwrap();
        assert_eq!(draft.mode, VerbosityMode::Terse);
        assert_eq!(
            draft.response.as_deref(),
            Some("O inventário é entregue anualmente.")
        );
        assert_eq!(draft.context.as_deref(), Some(""));
        assert_eq!(llm.call_count(), 1);
        assert!(llm.prompts()[0].1.is_deterministic());

        execute_approve(ApproveArgs { title: None }, &mut session, &quiet()).unwrap();
        assert_eq!(session.report.items()[0].title, "Item 1");
        assert_eq!(
            session.queue.as_slice(),
            ["Realizar monitoramento de ruído anual".to_string()]
        );
        assert!(session.draft.is_none());
    }

    #[test]
    fn test_regenerate_needs_previous_generation() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::new("Resposta.");
        let mut desk = desk(&dir, &llm);
        let mut session = session();
        open(1, &mut session);

        let result = execute_regenerate(
            GenerateArgs { mode: None },
            &mut desk,
            &mut session,
            &quiet(),
        );
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn test_regenerate_samples_new_candidate() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::new("Resposta técnica.");
        let mut desk = desk(&dir, &llm);
        let mut session = session();
        open(1, &mut session);

        execute_generate(GenerateArgs { mode: None }, &mut desk, &mut session, &quiet()).unwrap();
        let first = session.draft().unwrap().response.clone();
        execute_regenerate(GenerateArgs { mode: None }, &mut desk, &mut session, &quiet())
            .unwrap();
        let second = session.draft().unwrap().response.clone();

        assert_ne!(first, second);
        let prompts = llm.prompts();
        assert!(!prompts[1].1.is_deterministic());
    }

    #[test]
    fn test_regenerate_keeps_retrieval_warning() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::new("Resposta sem contexto.");
        let mut desk = desk(&dir, &llm);
        let mut session = session();
        open(1, &mut session);

        execute_generate(GenerateArgs { mode: None }, &mut desk, &mut session, &quiet()).unwrap();
        let reason = session.draft().unwrap().retrieval_unavailable.clone();
        assert!(reason.is_some());

        execute_regenerate(GenerateArgs { mode: None }, &mut desk, &mut session, &quiet())
            .unwrap();
        let draft = session.draft().unwrap();
        assert_eq!(draft.retrieval_unavailable, reason);
        assert!(draft.passages.is_empty());
    }

    #[test]
    fn test_edit_and_cancel() {
        let mut session = session();
        assert!(matches!(
            execute_edit(
                EditArgs {
                    requirement: false,
                    text: vec!["x".to_string()]
                },
                &mut session,
                &quiet()
            ),
            Err(CliError::Session(SessionError::NoDraft))
        ));

        open(1, &mut session);
        execute_edit(
            EditArgs {
                requirement: false,
                text: vec!["Resposta".to_string(), "manual.".to_string()],
            },
            &mut session,
            &quiet(),
        )
        .unwrap();
        assert_eq!(
            session.draft().unwrap().response.as_deref(),
            Some("Resposta manual.")
        );

        execute_cancel(&mut session, &quiet()).unwrap();
        assert!(session.draft.is_none());
        assert_eq!(session.queue.len(), 2);
        assert!(session.report.is_empty());
    }

    #[test]
    fn test_edit_requirement_then_approve() {
        let mut session = session();
        open(1, &mut session);
        execute_edit(
            EditArgs {
                requirement: true,
                text: vec!["Apresentar inventário de resíduos perigosos".to_string()],
            },
            &mut session,
            &quiet(),
        )
        .unwrap();
        let draft = session.draft().unwrap();
        assert_eq!(draft.requirement, "Apresentar inventário de resíduos perigosos");
        assert_eq!(draft.response, None);

        session.draft_mut().unwrap().response = Some("Inventário anexo.".to_string());
        execute_approve(ApproveArgs { title: None }, &mut session, &quiet()).unwrap();
        assert_eq!(
            session.report.items()[0].requirement,
            "Apresentar inventário de resíduos perigosos"
        );
        assert_eq!(
            session.queue.as_slice(),
            ["Realizar monitoramento de ruído anual".to_string()]
        );
    }

    #[test]
    fn test_approve_without_response() {
        let mut session = session();
        open(1, &mut session);
        let result = execute_approve(ApproveArgs { title: None }, &mut session, &quiet());
        assert!(matches!(
            result,
            Err(CliError::Session(SessionError::NoResponse))
        ));
        assert_eq!(session.queue.len(), 2);
    }
}
