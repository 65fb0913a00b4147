//! The services one CLI invocation works with.
//!
//! Providers use blocking HTTP clients, so they are built and dropped on the
//! main thread and only entered from the async pipeline through
//! `spawn_blocking`. Each command runs its future with [`Desk::block_on`].

use crate::config::Config;
use crate::error::{CliError, Result};
use ecodefense_domain::{KnowledgeRetriever, Passage};
use ecodefense_extractor::{IntakePipeline, ResponseGenerator};
use ecodefense_llm::Provider;
use ecodefense_store::{Embedder, EmptyRetriever, KnowledgeBase, StoreError};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Knowledge base when one could be opened, nothing otherwise
pub enum Retriever {
    /// Loaded knowledge base
    Knowledge(KnowledgeBase<Embedder>),
    /// No usable knowledge base
    Unavailable(EmptyRetriever),
}

impl KnowledgeRetriever for Retriever {
    type Error = StoreError;

    fn retrieve(&self, query: &str, k: usize) -> std::result::Result<Vec<Passage>, Self::Error> {
        match self {
            Retriever::Knowledge(kb) => kb.retrieve(query, k),
            Retriever::Unavailable(empty) => empty.retrieve(query, k),
        }
    }

    fn is_available(&self) -> bool {
        match self {
            Retriever::Knowledge(kb) => kb.is_available(),
            Retriever::Unavailable(empty) => empty.is_available(),
        }
    }
}

/// Configuration plus lazily built services and the async runtime.
pub struct Desk {
    config: Config,
    config_path: Option<PathBuf>,
    llm: Option<Arc<Provider>>,
    retriever: Option<Arc<Retriever>>,
    runtime: Runtime,
}

impl Desk {
    /// Create a desk for `config`; no provider is contacted yet.
    pub fn new(config: Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            config,
            config_path: None,
            llm: None,
            retriever: None,
            runtime,
        })
    }

    /// Remember the file the configuration came from.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Use `provider` instead of the configured one.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.llm = Some(Arc::new(provider));
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configuration file in use, or the default location.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Config::path(),
        }
    }

    /// Run `future` to completion on the desk's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// The language model, built from the configuration on first use.
    ///
    /// A missing API key surfaces here, not at startup, so commands that
    /// never call the model keep working without one.
    pub fn llm(&mut self) -> Result<Arc<Provider>> {
        if let Some(llm) = &self.llm {
            return Ok(Arc::clone(llm));
        }

        let llm = Arc::new(Provider::from_settings(&self.config.llm)?);
        self.llm = Some(Arc::clone(&llm));
        Ok(llm)
    }

    /// The knowledge base, opened on first use.
    ///
    /// Opening is best-effort: any failure leaves generation without context.
    pub fn retriever(&mut self) -> Arc<Retriever> {
        if let Some(retriever) = &self.retriever {
            return Arc::clone(retriever);
        }

        let retriever = Arc::new(match self.open_knowledge_base() {
            Ok(kb) => Retriever::Knowledge(kb),
            Err(e) => {
                warn!("Knowledge base not loaded: {}", e);
                Retriever::Unavailable(EmptyRetriever)
            }
        });
        self.retriever = Some(Arc::clone(&retriever));
        retriever
    }

    /// Forget the loaded knowledge base so the next use reopens it.
    pub fn reload_knowledge(&mut self) {
        self.retriever = None;
    }

    /// Import pipeline over the configured model.
    pub fn pipeline(&mut self) -> Result<IntakePipeline<Provider>> {
        let llm = self.llm()?;
        Ok(IntakePipeline::from_shared(llm, self.config.extractor.clone()))
    }

    /// Response generator over the configured model and knowledge base.
    pub fn generator(&mut self) -> Result<ResponseGenerator<Provider, Retriever>> {
        let llm = self.llm()?;
        let retriever = self.retriever();
        Ok(ResponseGenerator::from_shared(
            llm,
            retriever,
            self.config.extractor.clone(),
        ))
    }

    /// Embedder described by the configuration.
    pub fn embedder(&self) -> Result<Embedder> {
        Ok(Embedder::from_settings(&self.config.embedding)?)
    }

    fn open_knowledge_base(&self) -> Result<KnowledgeBase<Embedder>> {
        let path = self.config.knowledge_db_path()?;
        if !path.exists() {
            return Err(CliError::Config(format!(
                "no knowledge base at {}",
                path.display()
            )));
        }

        let kb = KnowledgeBase::open(&path, self.embedder()?)?;
        info!(path = %path.display(), chunks = kb.len(), "Opened knowledge base");
        Ok(kb)
    }
}
