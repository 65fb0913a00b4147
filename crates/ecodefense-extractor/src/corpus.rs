//! Knowledge-base building from a corpus directory

use crate::chunking::WindowChunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::pdf::TextExtractor;
use ecodefense_store::embedding::EmbeddingModel;
use ecodefense_store::{KnowledgeStore, SourceChunks};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extensions the builder reads
pub const CORPUS_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Summary of a knowledge-base build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Files whose chunks were stored
    pub files_indexed: usize,

    /// Files skipped, with the reason
    pub files_skipped: Vec<(PathBuf, String)>,

    /// Chunks stored
    pub chunks: usize,
}

/// Walks a corpus directory and fills a [`KnowledgeStore`]
pub struct CorpusIngestor<E> {
    embedder: E,
    chunker: WindowChunker,
}

impl<E: EmbeddingModel> CorpusIngestor<E> {
    /// Create an ingestor using the window settings of `config`
    pub fn new(embedder: E, config: &ExtractorConfig) -> Self {
        Self {
            embedder,
            chunker: WindowChunker::new(config.corpus_chunk_size, config.corpus_chunk_overlap),
        }
    }

    /// Embedder in use
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Corpus files under `root`, sorted by path
    pub fn discover(root: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
        if !root.is_dir() {
            return Err(ExtractorError::EmptyCorpus(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable corpus entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_corpus_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read the text of one corpus file
    pub fn load_text(path: &Path) -> Result<String, ExtractorError> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            Ok(TextExtractor::new().extract_file(path)?.text)
        } else {
            Ok(std::fs::read_to_string(path)?)
        }
    }

    /// Rebuild `store` from every corpus file under `root`
    ///
    /// Files that cannot be read or embedded are logged and skipped. The store
    /// is replaced in one transaction: when no chunk survives (`EmptyCorpus`)
    /// or writing fails, it keeps its previous contents.
    pub fn ingest(
        &self,
        root: &Path,
        store: &mut KnowledgeStore,
    ) -> Result<IngestReport, ExtractorError> {
        let files = Self::discover(root)?;
        info!(files = files.len(), root = %root.display(), "Building knowledge base");

        let mut report = IngestReport::default();
        let mut prepared = Vec::new();

        for path in files {
            match self.prepare(root, &path) {
                Ok((_, chunks)) if chunks.is_empty() => {
                    warn!(path = %path.display(), "Skipping file without text");
                    report.files_skipped.push((path, "no text".to_string()));
                }
                Ok(doc) => prepared.push(doc),
                Err(e) => {
                    warn!(path = %path.display(), "Skipping file: {}", e);
                    report.files_skipped.push((path, e.to_string()));
                }
            }
        }

        if prepared.is_empty() {
            return Err(ExtractorError::EmptyCorpus(root.display().to_string()));
        }

        report.chunks = store.replace_all(
            self.embedder.model_name(),
            self.embedder.dimension(),
            &prepared,
        )?;
        report.files_indexed = prepared.len();

        info!(
            files = report.files_indexed,
            skipped = report.files_skipped.len(),
            chunks = report.chunks,
            "Knowledge base built"
        );
        Ok(report)
    }

    /// One corpus file, chunked and embedded
    fn prepare(&self, root: &Path, path: &Path) -> Result<SourceChunks, ExtractorError> {
        let text = Self::load_text(path)?;
        let windows = self.chunker.chunk(&text);

        let mut chunks = Vec::with_capacity(windows.len());
        for window in windows {
            let embedding = self.embedder.embed(&window)?;
            chunks.push((window, embedding));
        }

        let source = source_label(root, path);
        debug!(source = %source, chunks = chunks.len(), "Prepared corpus file");
        Ok((source, chunks))
    }
}

fn is_corpus_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            CORPUS_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Path relative to the corpus root, with `/` separators
fn source_label(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
