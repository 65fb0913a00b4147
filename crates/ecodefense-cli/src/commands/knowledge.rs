//! Knowledge base command implementations.

use crate::cli::IndexArgs;
use crate::desk::Desk;
use crate::error::Result;
use crate::output::Formatter;
use ecodefense_extractor::CorpusIngestor;
use ecodefense_store::KnowledgeStore;
use std::fs;
use tracing::info;

/// Execute the index command.
///
/// Rebuilds the knowledge base from every supported file under the corpus
/// directory. An empty corpus leaves the previous knowledge base in place.
pub fn execute_index(args: IndexArgs, desk: &mut Desk, formatter: &Formatter) -> Result<()> {
    let path = desk.config().knowledge_db_path()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let ingestor = CorpusIngestor::new(desk.embedder()?, &desk.config().extractor);
    let mut store = KnowledgeStore::open(&path)?;
    let report = ingestor.ingest(&args.corpus, &mut store)?;
    desk.reload_knowledge();

    info!(
        corpus = %args.corpus.display(),
        db = %path.display(),
        chunks = report.chunks,
        "Knowledge base rebuilt"
    );
    println!("{}", formatter.format_ingest(&report)?);
    Ok(())
}

/// Execute the sources command.
pub fn execute_sources(desk: &Desk, formatter: &Formatter) -> Result<()> {
    let path = desk.config().knowledge_db_path()?;
    if !path.exists() {
        println!(
            "{}",
            formatter.info(&format!(
                "No knowledge base at {}; build one with 'ecodefense index <corpus>'",
                path.display()
            ))
        );
        return Ok(());
    }

    let store = KnowledgeStore::open(&path)?;
    if let Some(meta) = store.metadata()? {
        info!(model = %meta.model, dimension = meta.dimension, built_at = %meta.built_at, "Knowledge base");
    }
    println!("{}", formatter.format_sources(&store.sources()?)?);
    Ok(())
}
