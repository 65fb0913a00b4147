//! Document intake: text extraction, registrant and requirement extraction

use crate::chunking::TextChunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::generator::call_model;
use crate::pdf::{ExtractedText, TextExtractor};
use crate::prompt::{registrant_prompt, requirements_prompt};
use crate::registrant::parse_registrant;
use crate::splitter::{RequirementSplitter, SplitStrategy};
use crate::types::{ImportMetadata, ImportResult, PipelineWarning, RegistrantImport};
use ecodefense_domain::traits::{GenerationOptions, LlmProvider};
use ecodefense_domain::RegistrantRecord;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Requirements parsed from one or more model calls
#[derive(Debug, Clone, Default)]
pub struct RequirementExtraction {
    /// Requirements in document order
    pub requirements: Vec<String>,

    /// Non-fatal problems
    pub warnings: Vec<PipelineWarning>,

    /// Model calls made
    pub model_calls: usize,
}

/// Turns an uploaded licence into registrant data and a requirement queue
pub struct IntakePipeline<L> {
    llm: Arc<L>,
    config: ExtractorConfig,
}

impl<L> IntakePipeline<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Create a pipeline owning its model
    pub fn new(llm: L, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(llm), config)
    }

    /// Create a pipeline sharing its model with other components
    pub fn from_shared(llm: Arc<L>, config: ExtractorConfig) -> Self {
        Self { llm, config }
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Full import of a PDF file
    pub async fn import_full_file(&self, path: &Path) -> Result<ImportResult, ExtractorError> {
        let bytes = tokio::fs::read(path).await?;
        self.import_full(bytes).await
    }

    /// Registrant-only import of a PDF file
    pub async fn import_registrant_only_file(
        &self,
        path: &Path,
    ) -> Result<RegistrantImport, ExtractorError> {
        let bytes = tokio::fs::read(path).await?;
        self.import_registrant_only(bytes).await
    }

    /// Extract registrant data and requirements from PDF bytes
    ///
    /// No model call is made when text extraction fails. The registrant and
    /// requirement calls run concurrently.
    pub async fn import_full(&self, bytes: Vec<u8>) -> Result<ImportResult, ExtractorError> {
        let start = Instant::now();
        let extracted = self.extract_text(bytes, None).await?;
        let text_chars = extracted.text.chars().count();

        if text_chars > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(
                text_chars,
                self.config.max_text_length,
            ));
        }

        info!(
            pages = extracted.page_count,
            chars = text_chars,
            "Starting full import"
        );

        let (registrant, requirements) = tokio::join!(
            self.extract_registrant(&extracted.text),
            self.extract_requirements(&extracted.text)
        );
        let (registrant, registrant_warning) = registrant?;
        let requirements = requirements?;

        let mut warnings = pages_warning(&extracted);
        warnings.extend(registrant_warning);
        warnings.extend(requirements.warnings);

        let metadata = ImportMetadata {
            page_count: extracted.page_count,
            pages_read: extracted.pages_read,
            text_chars,
            model_calls: 1 + requirements.model_calls,
            model_name: self.llm.model_name().to_string(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            requirements = requirements.requirements.len(),
            warnings = warnings.len(),
            elapsed_ms = metadata.processing_time_ms,
            "Import complete"
        );

        Ok(ImportResult {
            registrant,
            requirements: requirements.requirements,
            warnings,
            metadata,
        })
    }

    /// Extract only registrant data from the first pages of PDF bytes
    ///
    /// The caller is expected to clear its requirement queue.
    pub async fn import_registrant_only(
        &self,
        bytes: Vec<u8>,
    ) -> Result<RegistrantImport, ExtractorError> {
        let start = Instant::now();
        let extracted = self
            .extract_text(bytes, Some(self.config.registrant_page_limit))
            .await?;

        info!(
            pages_read = extracted.pages_read,
            "Starting registrant-only import"
        );

        let (registrant, registrant_warning) = self.extract_registrant(&extracted.text).await?;

        let mut warnings = pages_warning(&extracted);
        warnings.extend(registrant_warning);

        Ok(RegistrantImport {
            registrant,
            warnings,
            metadata: ImportMetadata {
                page_count: extracted.page_count,
                pages_read: extracted.pages_read,
                text_chars: extracted.text.chars().count(),
                model_calls: 1,
                model_name: self.llm.model_name().to_string(),
                processing_time_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    /// Ask the model for registrant data and parse its answer
    pub async fn extract_registrant(
        &self,
        text: &str,
    ) -> Result<(RegistrantRecord, Option<PipelineWarning>), ExtractorError> {
        let prompt = registrant_prompt(text, self.config.registrant_prompt_chars);
        let output = call_model(
            &self.llm,
            prompt,
            GenerationOptions::deterministic(),
            self.config.model_timeout(),
        )
        .await?;

        let parsed = parse_registrant(&output);
        if parsed.is_complete() {
            debug!("Registrant data complete");
            return Ok((parsed.record, None));
        }

        warn!(missing = parsed.missing.len(), "Registrant output incomplete");
        Ok((
            parsed.record,
            Some(PipelineWarning::MalformedRegistrant {
                missing: parsed.missing,
            }),
        ))
    }

    /// Ask the model for the requirement list and split its answer
    ///
    /// Text longer than `max_chunk_size` is sent in chunks, one call each,
    /// and the per-chunk lists are concatenated in order.
    pub async fn extract_requirements(
        &self,
        text: &str,
    ) -> Result<RequirementExtraction, ExtractorError> {
        let chunker = TextChunker::new(self.config.chunk_strategy, self.config.max_chunk_size);
        let splitter = RequirementSplitter::new(
            self.config.requirement_delimiter.as_str(),
            self.config.min_requirement_length,
        );

        let chunks = chunker.chunk(text);
        if chunks.len() > 1 {
            info!("Text exceeds max chunk size, split into {} chunks", chunks.len());
        }

        let mut extraction = RequirementExtraction::default();
        let mut fell_back = false;

        for (idx, chunk) in chunks.iter().enumerate() {
            debug!("Requesting requirements for chunk {}/{}", idx + 1, chunks.len());
            let prompt = requirements_prompt(chunk, splitter.delimiter());
            let output = call_model(
                &self.llm,
                prompt,
                GenerationOptions::deterministic(),
                self.config.model_timeout(),
            )
            .await?;
            extraction.model_calls += 1;

            let outcome = splitter.split(&output);
            if outcome.strategy == SplitStrategy::LineFallback && !outcome.requirements.is_empty()
            {
                fell_back = true;
            }
            extraction.requirements.extend(outcome.requirements);
        }

        if fell_back {
            warn!("Requirement output lacked the delimiter, used line fallback");
            extraction
                .warnings
                .push(PipelineWarning::RequirementsLineFallback);
        }
        if extraction.requirements.is_empty() {
            warn!("No requirements extracted");
            extraction.warnings.push(PipelineWarning::NoRequirements);
        }

        Ok(extraction)
    }

    async fn extract_text(
        &self,
        bytes: Vec<u8>,
        page_limit: Option<usize>,
    ) -> Result<ExtractedText, ExtractorError> {
        tokio::task::spawn_blocking(move || {
            let extractor = match page_limit {
                Some(pages) => TextExtractor::with_page_limit(pages),
                None => TextExtractor::new(),
            };
            extractor.extract_bytes(&bytes)
        })
        .await?
    }
}

fn pages_warning(extracted: &ExtractedText) -> Vec<PipelineWarning> {
    if extracted.failed_pages.is_empty() {
        Vec::new()
    } else {
        vec![PipelineWarning::PagesSkipped {
            pages: extracted.failed_pages.clone(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_pdf;
    use ecodefense_llm::MockProvider;

    const REGISTRANT_OUTPUT: &str =
        "EMPRESA: Acme Ltda\nCNPJ: 12.345.678/0001-90\nENDERECO: Rua A, 100\nCIDADE: Curitiba";

    fn pipeline(llm: &MockProvider) -> IntakePipeline<MockProvider> {
        IntakePipeline::new(llm.clone(), ExtractorConfig::default())
    }

    #[tokio::test]
    async fn test_extract_requirements_line_fallback_warns() {
        let llm = MockProvider::new("Monitorar efluentes mensalmente\nok\nApresentar PGRS atualizado");
        let extraction = pipeline(&llm).extract_requirements("texto").await.unwrap();

        assert_eq!(extraction.requirements.len(), 2);
        assert_eq!(extraction.warnings, vec![PipelineWarning::RequirementsLineFallback]);
        assert_eq!(extraction.model_calls, 1);
    }

    #[tokio::test]
    async fn test_extract_requirements_chunks_concatenate_in_order() {
        let llm = MockProvider::new("unused");
        llm.respond_when_contains("PARTE UM", "Exigência da parte um ### Outra exigência da parte um");
        llm.respond_when_contains("PARTE DOIS", "Exigência da parte dois");
        let config = ExtractorConfig {
            max_chunk_size: 40,
            ..ExtractorConfig::default()
        };
        let pipeline = IntakePipeline::new(llm.clone(), config);

        let text = format!("PARTE UM {}\n\nPARTE DOIS {}", "x".repeat(20), "y".repeat(20));
        let extraction = pipeline.extract_requirements(&text).await.unwrap();

        assert_eq!(extraction.model_calls, 2);
        assert_eq!(
            extraction.requirements,
            vec![
                "Exigência da parte um",
                "Outra exigência da parte um",
                "Exigência da parte dois"
            ]
        );
        assert!(extraction.warnings.contains(&PipelineWarning::RequirementsLineFallback));
    }

    #[tokio::test]
    async fn test_no_requirements_warns() {
        let llm = MockProvider::new("nada");
        let extraction = pipeline(&llm).extract_requirements("texto").await.unwrap();

        assert!(extraction.requirements.is_empty());
        assert_eq!(extraction.warnings, vec![PipelineWarning::NoRequirements]);
    }

    #[tokio::test]
    async fn test_registrant_only_reads_three_pages_and_one_call() {
        let llm = MockProvider::new(REGISTRANT_OUTPUT);
        let pdf = test_pdf::build(&[
            Some("Pagina um"),
            Some("Pagina dois"),
            Some("Pagina tres"),
            Some("Pagina quatro"),
        ]);

        let import = pipeline(&llm).import_registrant_only(pdf).await.unwrap();

        assert_eq!(import.registrant.company, "Acme Ltda");
        assert_eq!(import.metadata.pages_read, 3);
        assert_eq!(import.metadata.page_count, 4);
        assert_eq!(llm.call_count(), 1);
        assert!(!llm.prompts()[0].0.contains("quatro"));
        assert!(import.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_text_too_long_makes_no_call() {
        let llm = MockProvider::new("unused");
        let config = ExtractorConfig {
            max_text_length: 10,
            max_chunk_size: 10,
            ..ExtractorConfig::default()
        };
        let pipeline = IntakePipeline::new(llm.clone(), config);
        let pdf = test_pdf::build(&[Some("A licence page with plenty of text")]);

        let result = pipeline.import_full(pdf).await;
        assert!(matches!(result, Err(ExtractorError::TextTooLong(_, 10))));
        assert_eq!(llm.call_count(), 0);
    }
}
