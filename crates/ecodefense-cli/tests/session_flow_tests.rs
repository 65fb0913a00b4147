//! Integration tests for a complete review session
//!
//! Drive the commands the way the binary does: build a knowledge base,
//! import a licence, answer a requirement, render the report, and reload the
//! saved session between steps.

use chrono::NaiveDate;
use ecodefense_cli::cli::{
    ApproveArgs, Command, GenerateArgs, ImportArgs, IndexArgs, OpenArgs, QueueAction, QueueArgs,
    RenderArgs,
};
use ecodefense_cli::config::OutputFormat;
use ecodefense_cli::{commands, Config, Desk, Formatter, SessionFile};
use ecodefense_domain::{Report, ReportItem, SignatureBlock, VerbosityMode};
use ecodefense_llm::{MockProvider, Provider};
use ecodefense_store::EmbeddingSettings;
use ecodefense_report::ReportRenderer;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Fragments that only appear in one prompt template each
const REGISTRANT_NEEDLE: &str = "devolva apenas as quatro linhas";
const REQUIREMENTS_NEEDLE: &str = "liste todas as condicionantes";

fn licence_llm() -> MockProvider {
    let llm = MockProvider::new("Os documentos são mantidos à disposição da fiscalização.");
    llm.respond_when_contains(
        REGISTRANT_NEEDLE,
        "EMPRESA: Metalúrgica Vale Ltda\nCNPJ: 98.765.432/0001-10\nENDERECO: Av. Brasil, 2000\nCIDADE: Joinville",
    );
    llm.respond_when_contains(
        REQUIREMENTS_NEEDLE,
        "Apresentar relatório semestral de efluentes ### Manter o PGRS atualizado e disponível",
    );
    llm
}

/// A text-bearing PDF standing in for the licence
fn write_licence(path: &Path) {
    let mut report = Report::new();
    report.approve(ReportItem::new(
        "Condicionantes",
        "LICENCA DE OPERACAO 456/2024",
        "1. Apresentar relatorio semestral de efluentes. 2. Manter o PGRS atualizado.",
    ));
    let signature = SignatureBlock {
        company: "Metalurgica Vale Ltda".to_string(),
        city: "Joinville".to_string(),
        ..SignatureBlock::default()
    };
    ReportRenderer::new()
        .with_title("LICENCA AMBIENTAL")
        .render_to_file(
            &report,
            &signature,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            path,
        )
        .unwrap();
}

struct Workspace {
    dir: TempDir,
    session_file: SessionFile,
    config: Config,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.knowledge.db_path = Some(dir.path().join("knowledge.db"));
        config.embedding = EmbeddingSettings::offline(384);
        config.output.directory = Some(dir.path().join("reports"));
        let session_file = SessionFile::new(dir.path().join("session.json"));
        Self {
            dir,
            session_file,
            config,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Load the session, run one command, save the session: one CLI invocation
    fn run(&self, llm: &MockProvider, command: Command) -> ecodefense_cli::Result<()> {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let mut desk = Desk::new(self.config.clone())?.with_provider(Provider::Mock(llm.clone()));
        let mut session = self.session_file.load(&self.config)?;
        commands::execute(command, &mut desk, &mut session, &formatter)?;
        self.session_file.save(&session)
    }
}

#[test]
fn test_review_session_end_to_end() {
    let ws = Workspace::new();
    let llm = licence_llm();

    let corpus = ws.path("corpus");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(
        corpus.join("efluentes.txt"),
        "Os relatórios semestrais de efluentes são protocolados junto ao órgão ambiental.",
    )
    .unwrap();
    fs::write(
        corpus.join("residuos.md"),
        "O PGRS é revisado anualmente pela equipe de meio ambiente.",
    )
    .unwrap();
    ws.run(&llm, Command::Index(IndexArgs { corpus })).unwrap();

    let licence = ws.path("licenca.pdf");
    write_licence(&licence);
    ws.run(
        &llm,
        Command::Import(ImportArgs {
            file: licence,
            registrant_only: false,
        }),
    )
    .unwrap();

    let session = ws.session_file.load(&ws.config).unwrap();
    assert_eq!(session.registrant.company, "Metalúrgica Vale Ltda");
    assert_eq!(session.registrant.city, "Joinville");
    assert_eq!(session.queue.len(), 2);

    ws.run(
        &llm,
        Command::Open(OpenArgs {
            index: Some(2),
            text: None,
            mode: Some(VerbosityMode::Terse),
        }),
    )
    .unwrap();
    ws.run(&llm, Command::Generate(GenerateArgs { mode: None })).unwrap();

    let session = ws.session_file.load(&ws.config).unwrap();
    let draft = session.draft.as_ref().unwrap();
    assert_eq!(draft.mode, VerbosityMode::Terse);
    assert!(draft.context.as_deref().unwrap().contains("PGRS"));
    assert_eq!(
        draft.response.as_deref(),
        Some("Os documentos são mantidos à disposição da fiscalização.")
    );
    assert_eq!(draft.retrieval_unavailable, None);
    let sources = draft.passages.clone();
    assert!(sources.iter().any(|p| p.source == "residuos.md"));

    ws.run(&llm, Command::Regenerate(GenerateArgs { mode: None })).unwrap();
    let session = ws.session_file.load(&ws.config).unwrap();
    let draft = session.draft.as_ref().unwrap();
    assert_eq!(draft.passages, sources);
    assert!(draft.context.as_deref().unwrap().contains("PGRS"));

    ws.run(
        &llm,
        Command::Approve(ApproveArgs {
            title: Some("Resíduos sólidos".to_string()),
        }),
    )
    .unwrap();

    let session = ws.session_file.load(&ws.config).unwrap();
    assert_eq!(session.report.len(), 1);
    assert_eq!(session.report.items()[0].title, "Resíduos sólidos");
    assert_eq!(
        session.report.items()[0].requirement,
        "Manter o PGRS atualizado e disponível"
    );
    assert_eq!(
        session.queue.as_slice(),
        ["Apresentar relatório semestral de efluentes".to_string()]
    );
    assert!(session.draft.is_none());

    ws.run(
        &llm,
        Command::Render(RenderArgs {
            output: None,
            date: NaiveDate::from_ymd_opt(2024, 6, 3),
        }),
    )
    .unwrap();
    let pdf = fs::read(
        ws.path("reports")
            .join("resposta-condicionantes-2024-06-03.pdf"),
    )
    .unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    // import + generate + regenerate
    assert_eq!(llm.call_count(), 4);
}

#[test]
fn test_registrant_only_import_clears_queue() {
    let ws = Workspace::new();
    let llm = licence_llm();

    ws.run(
        &llm,
        Command::Queue(QueueArgs {
            action: Some(QueueAction::Add {
                text: vec!["Exigência anterior ainda pendente".to_string()],
            }),
        }),
    )
    .unwrap();

    let licence = ws.path("licenca.pdf");
    write_licence(&licence);
    ws.run(
        &llm,
        Command::Import(ImportArgs {
            file: licence,
            registrant_only: true,
        }),
    )
    .unwrap();

    let session = ws.session_file.load(&ws.config).unwrap();
    assert!(session.queue.is_empty());
    assert_eq!(session.registrant.tax_id, "98.765.432/0001-10");
    assert_eq!(llm.call_count(), 1);
}

#[test]
fn test_failed_import_leaves_session_untouched() {
    let ws = Workspace::new();
    let llm = licence_llm();

    ws.run(
        &llm,
        Command::Queue(QueueArgs {
            action: Some(QueueAction::Add {
                text: vec!["Exigência anterior ainda pendente".to_string()],
            }),
        }),
    )
    .unwrap();

    let bogus = ws.path("corrompido.pdf");
    fs::write(&bogus, b"%PDF-1.7 truncated").unwrap();
    let result = ws.run(
        &llm,
        Command::Import(ImportArgs {
            file: bogus,
            registrant_only: false,
        }),
    );

    assert!(result.is_err());
    assert_eq!(llm.call_count(), 0);
    let session = ws.session_file.load(&ws.config).unwrap();
    assert_eq!(session.queue.len(), 1);
}

#[test]
fn test_generation_without_knowledge_base_still_answers() {
    let ws = Workspace::new();
    let llm = licence_llm();

    ws.run(
        &llm,
        Command::Open(OpenArgs {
            index: None,
            text: Some("Comprovar destinação de lâmpadas fluorescentes".to_string()),
            mode: None,
        }),
    )
    .unwrap();
    ws.run(&llm, Command::Generate(GenerateArgs { mode: None })).unwrap();

    let session = ws.session_file.load(&ws.config).unwrap();
    let draft = session.draft.as_ref().unwrap();
    assert!(draft.response.is_some());
    assert_eq!(draft.context.as_deref(), Some(""));
}

#[test]
#[ignore = "calls the configured chat completions endpoint; needs GROQ_API_KEY"]
fn test_live_generation() {
    let ws = Workspace::new();
    let formatter = Formatter::new(OutputFormat::Quiet, false);
    let mut desk = Desk::new(ws.config.clone()).unwrap();
    let mut session = ws.session_file.load(&ws.config).unwrap();
    session.open_manual_draft("Apresentar relatório anual de monitoramento de efluentes");

    commands::execute(
        Command::Generate(GenerateArgs { mode: None }),
        &mut desk,
        &mut session,
        &formatter,
    )
    .unwrap();
    assert!(!session.draft.unwrap().response.unwrap().is_empty());
}
