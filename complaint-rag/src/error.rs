//! Error types for the `complaint-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading artifacts or serving a question.
///
/// Only [`RagError::ArtifactLoad`] and [`RagError::Config`] ever reach a caller
/// of the pipeline. Retrieval and generation failures are contained inside
/// [`Pipeline::answer`](crate::Pipeline::answer) and surface as a refusal or a
/// tagged answer string instead.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred while embedding the query.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while searching the vector index.
    #[error("Vector index error ({backend}): {message}")]
    VectorIndex {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation model call failed.
    #[error("Generation error ({model}): {message}")]
    Generation {
        /// The generation model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation model did not answer before the configured deadline.
    #[error("Generation timed out ({model}) after {timeout_ms} ms")]
    GenerationTimeout {
        /// The generation model that timed out.
        model: String,
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },

    /// The persisted index artifact could not be loaded.
    #[error("Failed to load index artifact at {path}: {message}")]
    ArtifactLoad {
        /// The file or directory that failed to load.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
