//! Question-answering pipeline orchestrator.
//!
//! The [`Pipeline`] runs retrieval, the insufficient-evidence guard, context
//! assembly, prompt construction, and generation, and always returns a
//! [`PipelineResult`].
//!
//! # Example
//!
//! ```rust,ignore
//! use complaint_rag::{AnswerOptions, IndexArtifact, Pipeline, RagConfig};
//!
//! let artifact = IndexArtifact::load("vector_store/complaints")?;
//! let pipeline = Pipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .index(Arc::new(artifact.index))
//!     .document_store(Arc::new(artifact.store))
//!     .text_generator(Arc::new(model))
//!     .build()?;
//!
//! let result = pipeline.answer("Why are customers unhappy with money transfers?", AnswerOptions::full()).await;
//! println!("{}", result.answer);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::RagConfig;
use crate::docstore::DocumentStore;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{Generator, TextGenerator};
use crate::index::VectorIndex;
use crate::prompt::{PromptBuilder, REFUSAL_SENTENCE};
use crate::retriever::Retriever;

/// Diagnostic note attached to a refusal caused by too few retrieved excerpts.
pub const INSUFFICIENT_EVIDENCE_NOTE: &str = "Insufficient relevant complaint excerpts retrieved.";

/// Per-call options for [`Pipeline::answer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerOptions {
    /// Retrieval depth; the configured `default_k` when `None`.
    pub k: Option<usize>,
    /// Include stage timings in the result.
    pub return_timings: bool,
    /// Include the source excerpts in the result.
    pub return_docs: bool,
}

impl AnswerOptions {
    /// Options that request both timings and sources.
    pub fn full() -> Self {
        Self { k: None, return_timings: true, return_docs: true }
    }

    /// Override the retrieval depth.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }
}

/// Terminal state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The model produced an answer.
    Answered,
    /// Too little evidence was retrieved; the model was not called.
    Refused,
    /// The model call failed; the answer carries the tagged error.
    GenerationFailed,
}

/// Stage durations in seconds, rounded to two decimals.
///
/// `total_s` is the wall time from the start of the request. Each stage is the
/// difference between consecutive rounded boundary offsets, so the stages add
/// up to `total_s` and each is within 0.01 of its measured duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Timings {
    pub retrieval_s: f64,
    pub context_build_s: f64,
    pub generation_s: f64,
    pub total_s: f64,
}

impl Timings {
    /// Build timings from the instants at which each stage ended.
    fn from_marks(
        start: Instant,
        retrieved: Instant,
        context_built: Instant,
        finished: Instant,
    ) -> Self {
        let centis =
            |at: Instant| (at.saturating_duration_since(start).as_secs_f64() * 100.0).round() as u64;
        let (r, c, f) = (centis(retrieved), centis(context_built), centis(finished));
        let (c, f) = (c.max(r), f.max(c.max(r)));
        Self {
            retrieval_s: r as f64 / 100.0,
            context_build_s: (c - r) as f64 / 100.0,
            generation_s: (f - c) as f64 / 100.0,
            total_s: f as f64 / 100.0,
        }
    }
}

/// The structured answer returned for every question.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// The model answer, the refusal sentence, or a tagged generation error.
    pub answer: String,
    /// How the request ended.
    pub outcome: Outcome,
    /// Diagnostic note for refusals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// The excerpts that were placed in the prompt, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Arc<Document>>>,
    /// Stage timings, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<Timings>,
}

/// The question-answering pipeline.
///
/// Holds only shared, read-only collaborators; one instance can serve many
/// concurrent or sequential requests. Construct one via [`Pipeline::builder()`].
#[derive(Clone)]
pub struct Pipeline {
    config: RagConfig,
    retriever: Retriever,
    prompt_builder: PromptBuilder,
    generator: Generator,
}

impl Pipeline {
    /// Create a new [`PipelineBuilder`].
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `question` from the indexed complaints.
    ///
    /// Never fails: retrieval errors and too-small result sets produce the
    /// refusal sentence without calling the model; generation errors produce
    /// a tagged answer.
    #[instrument(skip_all, fields(question_len = question.len(), k = tracing::field::Empty))]
    pub async fn answer(&self, question: &str, options: AnswerOptions) -> PipelineResult {
        let k = options.k.unwrap_or(self.config.default_k);
        tracing::Span::current().record("k", k);

        let start = Instant::now();
        let retrieved = self.retriever.retrieve(question, k).await.inspect_err(|e| {
            warn!(error = %e, "retrieval failed; treating as no evidence");
        });
        let retrieved_at = Instant::now();

        let documents = match retrieved {
            Ok(documents) if documents.len() >= self.config.min_documents => documents,
            other => {
                let note = match other {
                    Err(e) => format!("{INSUFFICIENT_EVIDENCE_NOTE} Retrieval failed: {e}"),
                    Ok(documents) => {
                        warn!(
                            retrieved = documents.len(),
                            min_documents = self.config.min_documents,
                            "insufficient evidence; refusing without generation"
                        );
                        INSUFFICIENT_EVIDENCE_NOTE.to_string()
                    }
                };
                let finished_at = Instant::now();
                let timings = Timings::from_marks(start, retrieved_at, finished_at, finished_at);
                info!(outcome = ?Outcome::Refused, total_s = timings.total_s, "question answered");
                return PipelineResult {
                    answer: REFUSAL_SENTENCE.to_string(),
                    outcome: Outcome::Refused,
                    note: Some(note),
                    sources: options.return_docs.then(Vec::new),
                    timings: options.return_timings.then_some(timings),
                };
            }
        };

        let cap = documents.len().min(self.config.context_documents);
        let context =
            Retriever::assemble_context(&documents[..cap], self.config.max_context_chars);
        let prompt = self.prompt_builder.build(question, &context.text);
        let context_built_at = Instant::now();

        let generation = self.generator.generate(&prompt).await;
        let outcome =
            if generation.is_failure() { Outcome::GenerationFailed } else { Outcome::Answered };
        let timings = Timings::from_marks(start, retrieved_at, context_built_at, Instant::now());

        info!(
            outcome = ?outcome,
            retrieved = documents.len(),
            used = context.documents.len(),
            retrieval_s = timings.retrieval_s,
            context_build_s = timings.context_build_s,
            generation_s = timings.generation_s,
            total_s = timings.total_s,
            "question answered"
        );

        PipelineResult {
            answer: generation.answer,
            outcome,
            note: None,
            sources: options.return_docs.then_some(context.documents),
            timings: options.return_timings.then_some(timings),
        }
    }

    /// Answer with the default depth and render the used excerpts for display.
    ///
    /// Returns `(answer, sources)` where `sources` is produced by
    /// [`format_sources`]. Refusals return an empty sources string.
    pub async fn answer_question(&self, question: &str) -> (String, String) {
        let options = AnswerOptions { return_docs: true, ..AnswerOptions::default() };
        let result = self.answer(question, options).await;
        let sources = format_sources(result.sources.as_deref().unwrap_or_default());
        (result.answer, sources)
    }
}

/// Render excerpts as `Source 1:\n<content>`, separated by blank lines.
pub fn format_sources(documents: &[Arc<Document>]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, document)| format!("Source {}:\n{}", i + 1, document.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builder for constructing a [`Pipeline`].
///
/// Every field except `config` is required; the default [`RagConfig`] is
/// used when none is given.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    document_store: Option<Arc<dyn DocumentStore>>,
    text_generator: Option<Arc<dyn TextGenerator>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the query embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector index.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the document store.
    pub fn document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.document_store = Some(store);
        self
    }

    /// Set the generation model.
    pub fn text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    /// Build the [`Pipeline`], validating the configuration and that all
    /// collaborators are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a collaborator is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let index = self.index.ok_or_else(|| RagError::Config("index is required".to_string()))?;
        let document_store = self
            .document_store
            .ok_or_else(|| RagError::Config("document_store is required".to_string()))?;
        let text_generator = self
            .text_generator
            .ok_or_else(|| RagError::Config("text_generator is required".to_string()))?;

        Ok(Pipeline {
            retriever: Retriever::new(embedding_provider, index, document_store)
                .with_min_similarity(config.min_similarity),
            prompt_builder: PromptBuilder::from_config(&config),
            generator: Generator::from_config(text_generator, &config),
            config,
        })
    }
}
