//! Text generation with deterministic decoding, latency measurement, and
//! error containment.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::config::{DecodingOptions, RagConfig};
use crate::error::{RagError, Result};

/// Marker that opens every answer produced from a failed generation call.
pub const GENERATION_ERROR_MARKER: &str = "[Generation error:";

/// A generation model behind a narrow prompt-in, text-out interface.
///
/// Implementations must honor [`DecodingOptions`]; with sampling disabled the
/// same prompt must yield the same text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier of the underlying model, used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str, decoding: &DecodingOptions) -> Result<String>;
}

/// Outcome of a single [`Generator::generate`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    /// The trimmed model output, or a tagged error message.
    pub answer: String,
    /// Wall-clock seconds spent in the model call, measured on every path.
    pub elapsed_s: f64,
    /// The failure message when the call did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl Generation {
    /// Whether the model call failed.
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Wraps a [`TextGenerator`] so that it never returns an error.
///
/// Every call is bounded by the configured timeout; model errors, timeouts
/// and blank completions become an answer starting with
/// [`GENERATION_ERROR_MARKER`], so the answer is never empty.
#[derive(Clone)]
pub struct Generator {
    model: Arc<dyn TextGenerator>,
    decoding: DecodingOptions,
    timeout: Duration,
}

impl Generator {
    /// Create a generator with explicit decoding options and deadline.
    pub fn new(model: Arc<dyn TextGenerator>, decoding: DecodingOptions, timeout: Duration) -> Self {
        Self { model, decoding, timeout }
    }

    /// Create a generator from the pipeline configuration.
    pub fn from_config(model: Arc<dyn TextGenerator>, config: &RagConfig) -> Self {
        Self::new(
            model,
            config.decoding.clone(),
            Duration::from_millis(config.generation_timeout_ms),
        )
    }

    /// The decoding options sent with every call.
    pub fn decoding(&self) -> &DecodingOptions {
        &self.decoding
    }

    /// Run the model on `prompt`.
    pub async fn generate(&self, prompt: &str) -> Generation {
        let start = Instant::now();
        let outcome = match tokio::time::timeout(
            self.timeout,
            self.model.generate(prompt, &self.decoding),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RagError::GenerationTimeout {
                model: self.model.name().to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        let elapsed_s = start.elapsed().as_secs_f64();

        // A blank completion is not an answer.
        let outcome = outcome.and_then(|text| {
            let text = text.trim();
            if text.is_empty() {
                Err(RagError::Generation {
                    model: self.model.name().to_string(),
                    message: "model returned no text".to_string(),
                })
            } else {
                Ok(text.to_string())
            }
        });

        match outcome {
            Ok(answer) => {
                debug!(model = self.model.name(), elapsed_s, "generation completed");
                Generation { answer, elapsed_s, failure: None }
            }
            Err(e) => {
                error!(model = self.model.name(), error = %e, elapsed_s, "generation failed");
                let message = e.to_string();
                Generation {
                    answer: format!("{GENERATION_ERROR_MARKER} {message}]"),
                    elapsed_s,
                    failure: Some(message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str, decoding: &DecodingOptions) -> Result<String> {
            Ok(format!("  {prompt} beams={}  ", decoding.num_beams))
        }
    }

    struct Broken;

    #[async_trait]
    impl TextGenerator for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn generate(&self, _prompt: &str, _decoding: &DecodingOptions) -> Result<String> {
            Err(RagError::Generation { model: "broken".into(), message: "out of memory".into() })
        }
    }

    struct Blank;

    #[async_trait]
    impl TextGenerator for Blank {
        fn name(&self) -> &str {
            "blank"
        }

        async fn generate(&self, _prompt: &str, _decoding: &DecodingOptions) -> Result<String> {
            Ok("   \n ".into())
        }
    }

    struct Stuck;

    #[async_trait]
    impl TextGenerator for Stuck {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn generate(&self, _prompt: &str, _decoding: &DecodingOptions) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("never".into())
        }
    }

    #[tokio::test]
    async fn trims_output_and_passes_decoding() {
        let generator = Generator::from_config(Arc::new(Echo), &RagConfig::default());
        let generation = generator.generate("hello").await;
        assert_eq!(generation.answer, "hello beams=4");
        assert!(!generation.is_failure());
    }

    #[tokio::test]
    async fn model_error_becomes_tagged_answer() {
        let generator = Generator::from_config(Arc::new(Broken), &RagConfig::default());
        let generation = generator.generate("hello").await;
        assert!(generation.answer.starts_with(GENERATION_ERROR_MARKER));
        assert!(generation.answer.contains("out of memory"));
        assert!(generation.elapsed_s >= 0.0);
    }

    #[tokio::test]
    async fn blank_output_becomes_tagged_answer() {
        let generator = Generator::from_config(Arc::new(Blank), &RagConfig::default());
        let generation = generator.generate("hello").await;
        assert!(generation.is_failure());
        assert!(generation.answer.starts_with(GENERATION_ERROR_MARKER));
        assert!(generation.answer.contains("model returned no text"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_tagged_answer() {
        let generator =
            Generator::new(Arc::new(Stuck), DecodingOptions::default(), Duration::from_secs(5));
        let generation = generator.generate("hello").await;
        assert!(generation.answer.starts_with(GENERATION_ERROR_MARKER));
        assert!(generation.answer.contains("timed out"));
        assert!((generation.elapsed_s - 5.0).abs() < 0.5);
    }
}
