//! EcoDefense Extractor
//!
//! The requirement-extraction and response-generation pipeline.
//!
//! # Overview
//!
//! An uploaded licence goes through text extraction, then two independent
//! model calls: one for the registrant block, one for the list of technical
//! requirements. Each requirement can then be answered by the
//! [`ResponseGenerator`], which grounds the model in passages retrieved from
//! the knowledge base. The [`CorpusIngestor`] builds that knowledge base.
//!
//! # Architecture
//!
//! ```text
//! PDF → TextExtractor → text ─┬→ registrant prompt  → LLM → RegistrantFieldParser
//!                             └→ requirement prompt → LLM → RequirementSplitter
//!
//! requirement → KnowledgeRetriever → context → response prompt → LLM → response
//! ```
//!
//! Malformed model output never fails an import: the parsers degrade and a
//! [`PipelineWarning`] travels with the partial result. Document and service
//! failures are [`ExtractorError`]s.
//!
//! # Example Usage
//!
//! ```no_run
//! use ecodefense_extractor::{ExtractorConfig, IntakePipeline, ResponseGenerator};
//! use ecodefense_domain::VerbosityMode;
//! use ecodefense_llm::MockProvider;
//! use ecodefense_store::EmptyRetriever;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new("EMPRESA: Acme\nCNPJ: 1\nENDERECO: Rua A\nCIDADE: Curitiba");
//! let pipeline = IntakePipeline::new(llm.clone(), ExtractorConfig::default());
//!
//! let bytes = std::fs::read("licenca.pdf")?;
//! let import = pipeline.import_full(bytes).await?;
//! for warning in &import.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//!
//! let generator = ResponseGenerator::new(llm, EmptyRetriever, ExtractorConfig::default());
//! if let Some(requirement) = import.requirements.first() {
//!     let response = generator.generate(requirement, VerbosityMode::Balanced).await?;
//!     println!("{}", response.text);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod corpus;
mod error;
mod generator;
mod pdf;
mod pipeline;
mod prompt;
mod registrant;
mod splitter;
mod types;


pub use chunking::{TextChunker, WindowChunker};
pub use config::{ChunkStrategy, ExtractorConfig};
pub use corpus::{CorpusIngestor, IngestReport, CORPUS_EXTENSIONS};
pub use error::ExtractorError;
pub use generator::{join_passages, ResponseGenerator};
pub use pdf::{ExtractedText, TextExtractor};
pub use pipeline::{IntakePipeline, RequirementExtraction};
pub use prompt::{mode_instruction, registrant_prompt, requirements_prompt, response_prompt};
pub use registrant::{parse_registrant, RegistrantParse};
pub use splitter::{RequirementSplitter, SplitOutcome, SplitStrategy};
pub use types::{GeneratedResponse, ImportMetadata, ImportResult, PipelineWarning, RegistrantImport};
