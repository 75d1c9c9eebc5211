//! Batch run of the fixed evaluation questions.

use std::fmt::Write as _;

use complaint_rag::{AnswerOptions, Pipeline, PipelineResult};
use tracing::info;

/// Questions used to spot-check answer quality across product lines.
pub const EVAL_QUESTIONS: [&str; 5] = [
    "What are the most common issues users report with credit cards?",
    "Why are customers unhappy with Buy Now, Pay Later services?",
    "What complaints are frequently raised about money transfers?",
    "Are there recurring issues related to account closures?",
    "What customer pain points suggest compliance or fraud risks?",
];

const ANSWER_PREVIEW_CHARS: usize = 500;
const SOURCE_PREVIEW_CHARS: usize = 280;
const RULE_WIDTH: usize = 80;

/// Answer every question in order with timings and sources requested.
pub async fn run_evaluation(pipeline: &Pipeline, k: usize) -> Vec<(String, PipelineResult)> {
    let mut results = Vec::with_capacity(EVAL_QUESTIONS.len());
    for question in EVAL_QUESTIONS {
        let result = pipeline.answer(question, AnswerOptions::full().with_k(k)).await;
        info!(question, outcome = ?result.outcome, "evaluated question");
        results.push((question.to_string(), result));
    }
    results
}

fn preview(text: &str, limit: usize) -> (String, bool) {
    let clipped: String = text.chars().take(limit).collect();
    let truncated = text.chars().count() > limit;
    (clipped, truncated)
}

/// Human-readable report block for one evaluated question.
pub fn format_report(question: &str, result: &PipelineResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "QUESTION: {question}");
    let _ = writeln!(out, "ANSWER:");
    let (answer, truncated) = preview(&result.answer, ANSWER_PREVIEW_CHARS);
    let _ = writeln!(out, "{answer}{}", if truncated { " ..." } else { "" });
    if let Some(note) = &result.note {
        let _ = writeln!(out, "Note: {note}");
    }
    if let Some(t) = &result.timings {
        let _ = writeln!(
            out,
            "Timings: retrieval {:.2}s, context {:.2}s, generation {:.2}s, total {:.2}s",
            t.retrieval_s, t.context_build_s, t.generation_s, t.total_s
        );
    }
    if let Some(top) = result.sources.as_deref().and_then(|s| s.first()) {
        let (excerpt, _) = preview(&top.content, SOURCE_PREVIEW_CHARS);
        let _ = writeln!(out, "Top source excerpt:\n{excerpt}...");
    }
    out.push_str(&"-".repeat(RULE_WIDTH));
    out
}
