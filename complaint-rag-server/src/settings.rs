//! Launcher settings: config file loading and pipeline assembly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use complaint_rag::huggingface::{
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL,
};
use complaint_rag::{
    HuggingFaceEmbeddingProvider, HuggingFaceGenerator, IndexArtifact, Pipeline, RagConfig,
};
use tracing::info;

/// Environment variable naming the JSON pipeline config file.
pub const CONFIG_ENV: &str = "COMPLAINT_RAG_CONFIG";

/// Default location of the persisted index artifact.
pub const DEFAULT_INDEX_DIR: &str = "vector_store/faiss_complaints";

/// Everything needed to stand up a pipeline against the hosted models.
#[derive(Debug, Clone)]
pub struct Settings {
    pub index_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub generation_model: String,
    pub api_base: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            config_path: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            api_base: None,
        }
    }
}

/// Read a [`RagConfig`] from a JSON file. Absent keys take their defaults.
pub fn load_config(path: &Path) -> anyhow::Result<RagConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: RagConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Parse a retrieval depth from the command line. Zero is rejected.
pub fn parse_k(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("k must be greater than zero".to_string()),
        Ok(k) => Ok(k),
        Err(e) => Err(format!("invalid k `{raw}`: {e}")),
    }
}

impl Settings {
    /// The pipeline config: the configured file if any, otherwise defaults.
    pub fn rag_config(&self) -> anyhow::Result<RagConfig> {
        match &self.config_path {
            Some(path) => load_config(path),
            None => Ok(RagConfig::default()),
        }
    }

    /// Load the index artifact and connect the hosted models.
    ///
    /// Any artifact problem is returned before a single request is served.
    pub fn build_pipeline(&self) -> anyhow::Result<Pipeline> {
        let config = self.rag_config()?;

        let artifact = IndexArtifact::load(&self.index_dir).with_context(|| {
            format!("cannot start without the index at {}", self.index_dir.display())
        })?;

        let mut embedder = HuggingFaceEmbeddingProvider::from_env()?
            .with_model(&self.embedding_model, self.embedding_dimensions);
        let mut generator = HuggingFaceGenerator::from_env()?.with_model(&self.generation_model);
        if let Some(base) = &self.api_base {
            embedder = embedder.with_base_url(base);
            generator = generator.with_base_url(base);
        }

        let pipeline = Pipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(embedder))
            .index(Arc::new(artifact.index))
            .document_store(Arc::new(artifact.store))
            .text_generator(Arc::new(generator))
            .build()?;
        info!(
            embedding_model = %self.embedding_model,
            generation_model = %self.generation_model,
            "pipeline ready"
        );
        Ok(pipeline)
    }
}
