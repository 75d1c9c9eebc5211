//! Hugging Face Inference API clients for embeddings and text generation.
//!
//! This module is only available when the `huggingface` feature is enabled.
//! Both clients call `POST {base_url}/models/{model}` and work against the
//! hosted Inference API or a self-hosted endpoint exposing the same contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::DecodingOptions;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;

/// The default Inference API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// The default sentence embedding model. Must match the model the index was built with.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// The dimensionality of [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// The default text2text generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "google/flan-t5-base";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "HF_API_TOKEN";

fn token_from_env(provider: &str) -> Result<String> {
    std::env::var(TOKEN_ENV).map_err(|_| RagError::Config(format!(
        "{provider}: {TOKEN_ENV} environment variable not set"
    )))
}

fn model_url(base_url: &str, model: &str) -> String {
    format!("{}/models/{model}", base_url.trim_end_matches('/'))
}

// ── Inference API request/response types ───────────────────────────

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
    use_cache: bool,
}

const OPTIONS: InferenceOptions = InferenceOptions { wait_for_model: true, use_cache: true };

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
    options: &'a InferenceOptions,
}

/// Sentence-transformers return a pooled vector; plain encoders return one
/// vector per token.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<f32>),
    Tokens(Vec<Vec<f32>>),
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    options: &'a InferenceOptions,
}

#[derive(Serialize)]
struct GenerationParameters {
    do_sample: bool,
    num_beams: u32,
    max_new_tokens: u32,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Mean-pool token vectors into a single sentence vector.
fn mean_pool(tokens: Vec<Vec<f32>>) -> Option<Vec<f32>> {
    let count = tokens.len();
    let mut iter = tokens.into_iter();
    let mut sum = iter.next()?;
    for token in iter {
        for (acc, value) in sum.iter_mut().zip(token) {
            *acc += value;
        }
    }
    sum.iter_mut().for_each(|v| *v /= count as f32);
    Some(sum)
}

async fn post_json<B: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    token: &str,
    body: &B,
) -> std::result::Result<reqwest::Response, String> {
    let response = client
        .post(url)
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
        return Err(format!("API returned {status}: {detail}"));
    }
    Ok(response)
}

/// An [`EmbeddingProvider`] backed by the Inference API feature-extraction task.
///
/// # Example
///
/// ```rust,ignore
/// use complaint_rag::huggingface::HuggingFaceEmbeddingProvider;
///
/// let provider = HuggingFaceEmbeddingProvider::from_env()?;
/// let embedding = provider.embed("unauthorized charge").await?;
/// ```
pub struct HuggingFaceEmbeddingProvider {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl HuggingFaceEmbeddingProvider {
    /// Create a provider with the given API token and the default model.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(RagError::Embedding {
                provider: "HuggingFace".into(),
                message: "API token must not be empty".into(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_token,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        })
    }

    /// Create a provider using the `HF_API_TOKEN` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(token_from_env("HuggingFace embeddings")?)
    }

    /// Set the model and its output dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Point the client at a different Inference API endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn failure(&self, message: String) -> RagError {
        error!(provider = "HuggingFace", model = %self.model, %message, "embedding failed");
        RagError::Embedding { provider: format!("HuggingFace {}", self.model), message }
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "HuggingFace", model = %self.model, text_len = text.len(), "embedding text");

        let request = FeatureExtractionRequest { inputs: text, options: &OPTIONS };
        let url = model_url(&self.base_url, &self.model);
        let response = post_json(&self.client, &url, &self.api_token, &request)
            .await
            .map_err(|message| self.failure(message))?;

        let parsed: FeatureExtractionResponse = response
            .json()
            .await
            .map_err(|e| self.failure(format!("failed to parse response: {e}")))?;
        let embedding = match parsed {
            FeatureExtractionResponse::Pooled(vector) => vector,
            FeatureExtractionResponse::Tokens(tokens) => mean_pool(tokens)
                .ok_or_else(|| self.failure("API returned no token vectors".to_string()))?,
        };

        if embedding.len() != self.dimensions {
            return Err(self.failure(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`TextGenerator`] backed by the Inference API text2text-generation task.
///
/// Decoding options are forwarded as `parameters`, so beam search and
/// sampling are controlled server-side exactly as configured.
pub struct HuggingFaceGenerator {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    model: String,
}

impl HuggingFaceGenerator {
    /// Create a generator with the given API token and the default model.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(RagError::Generation {
                model: DEFAULT_GENERATION_MODEL.into(),
                message: "API token must not be empty".into(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_token,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_GENERATION_MODEL.into(),
        })
    }

    /// Create a generator using the `HF_API_TOKEN` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(token_from_env("HuggingFace generation")?)
    }

    /// Set the model name (e.g. `google/flan-t5-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different Inference API endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn failure(&self, message: String) -> RagError {
        RagError::Generation { model: self.model.clone(), message }
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, decoding: &DecodingOptions) -> Result<String> {
        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            num_beams = decoding.num_beams,
            do_sample = decoding.do_sample,
            "requesting generation"
        );

        let request = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                do_sample: decoding.do_sample,
                num_beams: decoding.num_beams,
                max_new_tokens: decoding.max_new_tokens,
            },
            options: &OPTIONS,
        };
        let url = model_url(&self.base_url, &self.model);
        let response = post_json(&self.client, &url, &self.api_token, &request)
            .await
            .map_err(|message| self.failure(message))?;

        let generated: Vec<GeneratedText> = response
            .json()
            .await
            .map_err(|e| self.failure(format!("failed to parse response: {e}")))?;
        generated
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| self.failure("API returned no generations".to_string()))
    }
}
