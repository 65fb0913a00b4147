//! Retrieval-augmented response generation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::prompt::response_prompt;
use crate::types::{GeneratedResponse, PipelineWarning};
use ecodefense_domain::traits::{GenerationOptions, KnowledgeRetriever, LlmProvider, Passage};
use ecodefense_domain::VerbosityMode;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Run one blocking model call on the blocking pool, bounded by `budget`
///
/// The provider retries inside the call, so `budget` is a deadline for the
/// whole retry schedule, not for a single attempt.
pub(crate) async fn call_model<L>(
    llm: &Arc<L>,
    prompt: String,
    options: GenerationOptions,
    budget: Duration,
) -> Result<String, ExtractorError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    let llm = Arc::clone(llm);
    debug!(
        prompt_chars = prompt.len(),
        temperature = options.temperature,
        "Calling model"
    );

    let task = tokio::task::spawn_blocking(move || {
        llm.generate(&prompt, &options)
            .map_err(|e| ExtractorError::ModelCall(e.to_string()))
    });

    let joined = timeout(budget, task)
        .await
        .map_err(|_| ExtractorError::Timeout(budget))?;
    joined?
}

/// Answers requirements from retrieved context
pub struct ResponseGenerator<L, R> {
    llm: Arc<L>,
    retriever: Arc<R>,
    config: ExtractorConfig,
}

impl<L, R> ResponseGenerator<L, R>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    R: KnowledgeRetriever + Send + Sync + 'static,
    R::Error: Display,
{
    /// Create a generator owning its collaborators
    pub fn new(llm: L, retriever: R, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(llm), Arc::new(retriever), config)
    }

    /// Create a generator sharing collaborators with other components
    pub fn from_shared(llm: Arc<L>, retriever: Arc<R>, config: ExtractorConfig) -> Self {
        Self {
            llm,
            retriever,
            config,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Retrieve up to `retrieval_k` passages for `requirement`
    ///
    /// Best-effort: a missing, empty or failing knowledge base gives no
    /// passages and a `RetrievalUnavailable` warning.
    pub async fn retrieve(
        &self,
        requirement: &str,
    ) -> Result<(Vec<Passage>, Option<PipelineWarning>), ExtractorError> {
        if !self.retriever.is_available() {
            warn!("Knowledge base unavailable, generating without context");
            return Ok((
                Vec::new(),
                Some(PipelineWarning::RetrievalUnavailable {
                    reason: "knowledge base is missing or empty".to_string(),
                }),
            ));
        }

        let retriever = Arc::clone(&self.retriever);
        let query = requirement.to_string();
        let k = self.config.retrieval_k;
        let result = tokio::task::spawn_blocking(move || {
            retriever.retrieve(&query, k).map_err(|e| e.to_string())
        })
        .await?;

        match result {
            Ok(passages) => {
                debug!(found = passages.len(), k, "Retrieved context");
                Ok((passages, None))
            }
            Err(reason) => {
                warn!("Retrieval failed, generating without context: {}", reason);
                Ok((
                    Vec::new(),
                    Some(PipelineWarning::RetrievalUnavailable { reason }),
                ))
            }
        }
    }

    /// Retrieve context for `requirement` and generate a deterministic response
    pub async fn generate(
        &self,
        requirement: &str,
        mode: VerbosityMode,
    ) -> Result<GeneratedResponse, ExtractorError> {
        let (passages, warning) = self.retrieve(requirement).await?;
        let context = join_passages(&passages);

        let mut response = self
            .generate_with_context(requirement, context, passages, mode, 0.0)
            .await?;
        response.warnings.extend(warning);
        Ok(response)
    }

    /// Generate from an already-built context at `temperature`
    pub async fn generate_with_context(
        &self,
        requirement: &str,
        context: String,
        passages: Vec<Passage>,
        mode: VerbosityMode,
        temperature: f32,
    ) -> Result<GeneratedResponse, ExtractorError> {
        let prompt = response_prompt(requirement, &context, mode);
        let text = call_model(
            &self.llm,
            prompt,
            GenerationOptions::with_temperature(temperature),
            self.config.model_timeout(),
        )
        .await?;

        info!(
            mode = %mode,
            temperature,
            context_chars = context.len(),
            response_chars = text.len(),
            "Generated response"
        );

        Ok(GeneratedResponse {
            text: text.trim().to_string(),
            requirement: requirement.to_string(),
            context,
            passages,
            mode,
            temperature,
            warnings: Vec::new(),
        })
    }

    /// Produce a new candidate for the same requirement and context
    ///
    /// Samples at `regenerate_temperature`; `previous` is left untouched.
    pub async fn regenerate(
        &self,
        previous: &GeneratedResponse,
    ) -> Result<GeneratedResponse, ExtractorError> {
        self.regenerate_in_mode(previous, previous.mode).await
    }

    /// Like [`regenerate`](Self::regenerate) with another verbosity mode
    pub async fn regenerate_in_mode(
        &self,
        previous: &GeneratedResponse,
        mode: VerbosityMode,
    ) -> Result<GeneratedResponse, ExtractorError> {
        let mut response = self
            .generate_with_context(
                &previous.requirement,
                previous.context.clone(),
                previous.passages.clone(),
                mode,
                self.config.regenerate_temperature,
            )
            .await?;
        response.warnings = previous.warnings.clone();
        Ok(response)
    }
}

/// Context string handed to the prompt: passage texts joined by newlines
pub fn join_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
