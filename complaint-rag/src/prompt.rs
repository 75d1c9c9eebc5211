//! Prompt construction with a context sufficiency guard.

use crate::config::RagConfig;

/// The sentence the model is told to emit when the context does not support
/// an answer. The pipeline returns it verbatim when it refuses on its own.
pub const REFUSAL_SENTENCE: &str = "I do not have enough information to answer this question.";

/// Placeholder substituted for contexts too short to ground an answer.
pub const INSUFFICIENT_CONTEXT_SENTINEL: &str = "[Insufficient relevant context retrieved]";

/// Default instruction template. Restricts the model to the supplied excerpts
/// and names the exact refusal sentence.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a financial analyst assistant for CrediTrust.

RULES:
- Use ONLY the complaint excerpts below.
- Do NOT use outside knowledge or assumptions.
- Do NOT list issues not directly mentioned in the excerpts.
- If the answer is not clearly supported, respond ONLY with:
  \"I do not have enough information to answer this question.\"

Complaint Excerpts:
{context}

Question:
{question}

Answer (concise, analytical):
";

/// Renders the final prompt from a template, a question, and a context.
///
/// The builder clips the context to `max_context_chars` regardless of who
/// produced it, then swaps it for [`INSUFFICIENT_CONTEXT_SENTINEL`] when fewer
/// than `min_context_chars` characters remain after trimming whitespace.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
    max_context_chars: usize,
    min_context_chars: usize,
}

impl PromptBuilder {
    /// Create a builder from explicit parameters.
    pub fn new(
        template: impl Into<String>,
        max_context_chars: usize,
        min_context_chars: usize,
    ) -> Self {
        Self { template: template.into(), max_context_chars, min_context_chars }
    }

    /// Create a builder from the pipeline configuration.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(&config.prompt_template, config.max_context_chars, config.min_context_chars)
    }

    /// Build the prompt for `question` grounded on `context`.
    pub fn build(&self, question: &str, context: &str) -> String {
        let clipped = clip_chars(context, self.max_context_chars);
        let context = if clipped.trim().chars().count() < self.min_context_chars {
            INSUFFICIENT_CONTEXT_SENTINEL
        } else {
            clipped
        };
        render(&self.template, context, question)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

/// Return the longest prefix of `text` holding at most `max_chars` characters.
fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Substitute both slots in a single left-to-right pass, so slot markers that
/// appear inside the question or context are never expanded.
fn render(template: &str, context: &str, question: &str) -> String {
    const SLOTS: [&str; 2] = ["{context}", "{question}"];

    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;
    loop {
        let next = SLOTS
            .iter()
            .filter_map(|slot| rest.find(slot).map(|at| (at, *slot)))
            .min_by_key(|(at, _)| *at);
        let Some((at, slot)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..at]);
        out.push_str(if slot == "{context}" { context } else { question });
        rest = &rest[at + slot.len()..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_context() -> String {
        "Customers report duplicate charges and unexplained late fees. ".repeat(5)
    }

    #[test]
    fn short_context_becomes_sentinel() {
        let prompt = PromptBuilder::default().build("Why?", "   too short   ");
        assert!(prompt.contains(INSUFFICIENT_CONTEXT_SENTINEL));
        assert!(!prompt.contains("too short"));
    }

    #[test]
    fn sufficient_context_is_embedded() {
        let context = long_context();
        let prompt = PromptBuilder::default().build("What fees?", &context);
        assert!(prompt.contains(&context));
        assert!(prompt.contains("What fees?"));
        assert!(!prompt.contains(INSUFFICIENT_CONTEXT_SENTINEL));
        assert!(prompt.contains(REFUSAL_SENTENCE));
    }

    #[test]
    fn context_is_clipped_to_budget() {
        let builder = PromptBuilder::new("<{context}>", 200, 10);
        let prompt = builder.build("q", &"é".repeat(500));
        assert_eq!(prompt.chars().count(), 202);
    }

    #[test]
    fn clip_happens_before_sufficiency_check() {
        // 100 spaces of padding: after clipping only 20 real characters survive.
        let context = format!("{}{}", " ".repeat(100), long_context());
        let builder = PromptBuilder::new("{context}|{question}", 120, 50);
        assert_eq!(builder.build("q", &context), format!("{INSUFFICIENT_CONTEXT_SENTINEL}|q"));
    }

    #[test]
    fn slot_markers_in_input_are_not_expanded() {
        let builder = PromptBuilder::new("C={context} Q={question}", 1000, 1);
        let prompt = builder.build("what about {context}?", "text with {question} inside");
        assert_eq!(prompt, "C=text with {question} inside Q=what about {context}?");
    }
}
