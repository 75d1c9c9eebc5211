//! Property tests for context assembly and the prompt sufficiency guard.

use std::sync::Arc;

use complaint_rag::{
    Document, INSUFFICIENT_CONTEXT_SENTINEL, ProductCategory, PromptBuilder, Retriever,
};
use proptest::prelude::*;

fn arb_documents() -> impl Strategy<Value = Vec<Arc<Document>>> {
    proptest::collection::vec("[ a-zé.]{0,120}", 0..8).prop_map(|contents| {
        contents
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                Arc::new(Document::new(
                    format!("doc-{i}"),
                    content,
                    i.to_string(),
                    ProductCategory::CreditCard,
                ))
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* documents and budget `N`, the context SHALL hold at most `N`
    /// characters and consist only of whole, trimmed, non-empty documents.
    #[test]
    fn context_is_bounded_and_made_of_whole_documents(
        docs in arb_documents(),
        budget in 0usize..400,
    ) {
        let assembled = Retriever::assemble_context(&docs, budget);
        prop_assert!(assembled.text.chars().count() <= budget);

        let expected: Vec<&str> =
            assembled.documents.iter().map(|d| d.content.trim()).collect();
        prop_assert!(expected.iter().all(|text| !text.is_empty()));
        prop_assert_eq!(&assembled.text, &expected.join("\n\n"));

        // Included documents keep rank order.
        let ranks: Vec<usize> = assembled
            .documents
            .iter()
            .map(|d| docs.iter().position(|o| Arc::ptr_eq(o, d)).unwrap())
            .collect();
        prop_assert!(ranks.windows(2).all(|w| w[0] < w[1]));

        prop_assert_eq!(Retriever::context_string(&docs, budget), assembled.text);
    }

    /// *For any* context whose clipped, trimmed form is shorter than the
    /// minimum, the prompt SHALL carry the sentinel instead of the context.
    #[test]
    fn short_contexts_are_replaced_by_sentinel(
        context in "[ a-z]{0,60}",
        question in "[a-z ?]{1,30}",
    ) {
        let builder = PromptBuilder::new("[{context}] {question}", 100, 50);
        let prompt = builder.build(&question, &context);
        if context.trim().chars().count() < 50 {
            prop_assert_eq!(prompt, format!("[{INSUFFICIENT_CONTEXT_SENTINEL}] {question}"));
        } else {
            prop_assert_eq!(prompt, format!("[{context}] {question}"));
        }
    }
}
