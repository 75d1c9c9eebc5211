//! Configuration for the question-answering pipeline.
//!
//! Every heuristic threshold the pipeline applies lives here so deployments
//! can tune them without touching the retrieval or generation code.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::prompt::DEFAULT_PROMPT_TEMPLATE;

/// Decoding parameters passed to the generation model.
///
/// The defaults disable sampling and use a fixed beam width so identical
/// prompts produce identical answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DecodingOptions {
    /// Whether the model may sample tokens. Must stay `false` for reproducible output.
    pub do_sample: bool,
    /// Beam width for beam search.
    pub num_beams: u32,
    /// Upper bound on generated tokens.
    pub max_new_tokens: u32,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self { do_sample: false, num_beams: 4, max_new_tokens: 150 }
    }
}

/// Configuration parameters for the question-answering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Number of neighbors retrieved when the caller does not specify `k`.
    pub default_k: usize,
    /// Hits scoring below this similarity are discarded before the evidence
    /// count. `None` keeps every hit.
    pub min_similarity: Option<f32>,
    /// Fewest retrieved documents that still allow generation; below this the
    /// pipeline refuses without calling the model.
    pub min_documents: usize,
    /// Most documents admitted into the prompt context.
    pub context_documents: usize,
    /// Character budget for the prompt context.
    pub max_context_chars: usize,
    /// Contexts shorter than this (after trimming) are replaced by the
    /// insufficient-context sentinel.
    pub min_context_chars: usize,
    /// Prompt template with `{context}` and `{question}` slots.
    pub prompt_template: String,
    /// Decoding parameters for the generation model.
    pub decoding: DecodingOptions,
    /// Deadline for a single generation call, in milliseconds.
    pub generation_timeout_ms: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            min_similarity: None,
            min_documents: 2,
            context_documents: 3,
            max_context_chars: 3200,
            min_context_chars: 150,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            decoding: DecodingOptions::default(),
            generation_timeout_ms: 60_000,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `default_k`, `min_documents` or `context_documents` is zero
    /// - `min_context_chars >= max_context_chars`
    /// - the prompt template lacks a `{context}` or `{question}` slot
    /// - `decoding.num_beams == 0`
    pub fn validate(&self) -> Result<()> {
        if self.default_k == 0 {
            return Err(RagError::Config("default_k must be greater than zero".to_string()));
        }
        if self.min_documents == 0 {
            return Err(RagError::Config("min_documents must be greater than zero".to_string()));
        }
        if self.context_documents == 0 {
            return Err(RagError::Config(
                "context_documents must be greater than zero".to_string(),
            ));
        }
        if self.min_context_chars >= self.max_context_chars {
            return Err(RagError::Config(format!(
                "min_context_chars ({}) must be less than max_context_chars ({})",
                self.min_context_chars, self.max_context_chars
            )));
        }
        for slot in ["{context}", "{question}"] {
            if !self.prompt_template.contains(slot) {
                return Err(RagError::Config(format!("prompt_template is missing the {slot} slot")));
            }
        }
        if self.decoding.num_beams == 0 {
            return Err(RagError::Config("decoding.num_beams must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the default retrieval depth.
    pub fn default_k(mut self, k: usize) -> Self {
        self.config.default_k = k;
        self
    }

    /// Set the minimum similarity a hit needs to count as evidence.
    pub fn min_similarity(mut self, min_similarity: f32) -> Self {
        self.config.min_similarity = Some(min_similarity);
        self
    }

    /// Set the minimum number of documents required before generating.
    pub fn min_documents(mut self, n: usize) -> Self {
        self.config.min_documents = n;
        self
    }

    /// Set the maximum number of documents admitted into the context.
    pub fn context_documents(mut self, n: usize) -> Self {
        self.config.context_documents = n;
        self
    }

    /// Set the context character budget.
    pub fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = chars;
        self
    }

    /// Set the minimum useful context length.
    pub fn min_context_chars(mut self, chars: usize) -> Self {
        self.config.min_context_chars = chars;
        self
    }

    /// Replace the prompt template.
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = template.into();
        self
    }

    /// Set the decoding parameters.
    pub fn decoding(mut self, decoding: DecodingOptions) -> Self {
        self.config.decoding = decoding;
        self
    }

    /// Set the generation deadline in milliseconds.
    pub fn generation_timeout_ms(mut self, ms: u64) -> Self {
        self.config.generation_timeout_ms = ms;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
