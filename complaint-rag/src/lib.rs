//! # complaint-rag
//!
//! Retrieval-augmented question answering over customer complaint narratives.
//!
//! ## Overview
//!
//! A question is embedded, matched against a pre-built vector index of
//! complaint excerpts, and answered by a generation model that is only shown
//! the best-matching excerpts. The crate provides:
//!
//! - [`Retriever`] - embed → search → resolve, plus bounded context assembly
//! - [`PromptBuilder`] - fixed instruction template with a context sufficiency guard
//! - [`Generator`] - deterministic decoding, latency measurement, error containment
//! - [`Pipeline`] - orchestration, the insufficient-evidence guard, and timings
//! - [`IndexArtifact`] - fail-fast loading of the persisted index and document store
//!
//! Model backends sit behind the [`EmbeddingProvider`] and [`TextGenerator`]
//! traits. The `huggingface` feature adds clients for the Hugging Face
//! Inference API.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use complaint_rag::{AnswerOptions, IndexArtifact, Pipeline};
//!
//! let artifact = IndexArtifact::load("vector_store/complaints")?;
//! let pipeline = Pipeline::builder()
//!     .embedding_provider(Arc::new(embedder))
//!     .index(Arc::new(artifact.index))
//!     .document_store(Arc::new(artifact.store))
//!     .text_generator(Arc::new(model))
//!     .build()?;
//!
//! let (answer, sources) = pipeline.answer_question("What issues do customers report with credit cards?").await;
//! ```

pub mod artifact;
pub mod category;
pub mod config;
pub mod docstore;
pub mod document;
pub mod embedding;
pub mod error;
pub mod flat;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

#[cfg(feature = "huggingface")]
pub mod huggingface;

pub use artifact::IndexArtifact;
pub use category::ProductCategory;
pub use config::{DecodingOptions, RagConfig, RagConfigBuilder};
pub use docstore::{DocumentStore, InMemoryDocumentStore};
pub use document::{Document, DocumentMetadata, RetrievalResult, ScoredDocument};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use flat::FlatIndex;
pub use generation::{GENERATION_ERROR_MARKER, Generation, Generator, TextGenerator};
pub use index::{Neighbor, VectorIndex};
pub use pipeline::{
    AnswerOptions, INSUFFICIENT_EVIDENCE_NOTE, Outcome, Pipeline, PipelineBuilder,
    PipelineResult, Timings, format_sources,
};
pub use prompt::{INSUFFICIENT_CONTEXT_SENTINEL, PromptBuilder, REFUSAL_SENTENCE};
pub use retriever::{AssembledContext, Retriever};

#[cfg(feature = "huggingface")]
pub use huggingface::{HuggingFaceEmbeddingProvider, HuggingFaceGenerator};
