//! Command-line launcher for the complaint question-answering assistant.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use complaint_rag::huggingface::{
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL,
};
use complaint_rag::{AnswerOptions, format_sources};
use complaint_rag_server::settings::{DEFAULT_INDEX_DIR, parse_k};
use complaint_rag_server::{
    AppState, ServerConfig, Settings, format_report, run_evaluation, run_server,
};
use tracing_subscriber::EnvFilter;

/// Ask questions about customer complaints, grounded in retrieved narratives.
#[derive(Parser, Debug)]
#[command(name = "complaint-rag", version, about, long_about = None)]
struct Cli {
    /// Directory holding index.json and docstore.json
    #[arg(long, env = "COMPLAINT_RAG_INDEX", default_value = DEFAULT_INDEX_DIR)]
    index: PathBuf,

    /// Pipeline configuration file (JSON)
    #[arg(short, long, env = "COMPLAINT_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Embedding model id
    #[arg(long, env = "COMPLAINT_RAG_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Embedding vector dimensions
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// Generation model id
    #[arg(long, env = "COMPLAINT_RAG_GENERATION_MODEL", default_value = DEFAULT_GENERATION_MODEL)]
    generation_model: String,

    /// Override the inference API base URL
    #[arg(long, env = "COMPLAINT_RAG_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "COMPLAINT_RAG_HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(short, long, env = "COMPLAINT_RAG_PORT", default_value_t = 8088)]
        port: u16,
    },
    /// Answer a single question and print its sources
    Ask {
        question: String,
        /// Neighbors to retrieve
        #[arg(short, value_parser = parse_k)]
        k: Option<usize>,
    },
    /// Run the fixed evaluation questions
    Evaluate {
        #[arg(short, default_value_t = 5, value_parser = parse_k)]
        k: usize,
    },
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            index_dir: self.index.clone(),
            config_path: self.config.clone(),
            embedding_model: self.embedding_model.clone(),
            embedding_dimensions: self.embedding_dimensions,
            generation_model: self.generation_model.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let pipeline = cli.settings().build_pipeline()?;

    match cli.command {
        Commands::Serve { host, port } => {
            run_server(ServerConfig { host, port }, AppState::new(pipeline)).await
        }
        Commands::Ask { question, k } => {
            let options = AnswerOptions { k, return_timings: true, return_docs: true };
            let result = pipeline.answer(&question, options).await;
            println!("{}", result.answer);
            if let Some(sources) = result.sources.as_deref().filter(|s| !s.is_empty()) {
                println!("\n{}", format_sources(sources));
            }
            if let Some(note) = result.note {
                eprintln!("{note}");
            }
            Ok(())
        }
        Commands::Evaluate { k } => {
            println!("{}\nRunning evaluation questions\n{}", "=".repeat(70), "=".repeat(70));
            for (question, result) in run_evaluation(&pipeline, k).await {
                println!("\n{}", format_report(&question, &result));
            }
            Ok(())
        }
    }
}
