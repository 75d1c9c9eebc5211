//! `complaint-rag-server` exposes the complaint question-answering pipeline
//! over HTTP and drives it from the command line.

pub mod eval;
pub mod server;
pub mod settings;

pub use eval::{EVAL_QUESTIONS, format_report, run_evaluation};
pub use server::{AppState, ServerConfig, app_router, run_server};
pub use settings::{Settings, load_config};
