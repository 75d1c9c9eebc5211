//! Query-time retrieval: embed → search → resolve, plus context assembly.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::docstore::DocumentStore;
use crate::document::{Document, RetrievalResult, ScoredDocument};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::VectorIndex;

/// Separator placed between documents in an assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// A context string together with the documents that made it in.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    /// The joined document contents.
    pub text: String,
    /// The documents included in `text`, in rank order.
    pub documents: Vec<Arc<Document>>,
}

/// Turns a query string into ranked complaint excerpts.
///
/// Holds shared references to the read-only index, document store, and
/// embedding model; cloning a `Retriever` is cheap.
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn DocumentStore>,
    min_similarity: Option<f32>,
}

impl Retriever {
    /// Create a retriever over an index and its document store.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self { embedding_provider, index, store, min_similarity: None }
    }

    /// Drop hits scoring below `min_similarity`. Hits without a score are kept.
    pub fn with_min_similarity(mut self, min_similarity: Option<f32>) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Retrieve up to `k` documents for `query`, best first.
    ///
    /// Neighbors whose position or id cannot be resolved are skipped, as are
    /// hits below the minimum similarity, and a document reached through two
    /// positions is returned once, so the result may hold fewer than `k`
    /// documents.
    ///
    /// # Errors
    ///
    /// Returns the embedding or index error unchanged.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let resolved = self.search(query, k).await?;
        Ok(resolved.into_iter().map(|(document, _)| document).collect())
    }

    /// Retrieve up to `k` documents with their similarity scores.
    ///
    /// When the index does not report a score for a hit, the score is `0.0`
    /// and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns the embedding or index error unchanged.
    pub async fn retrieve_with_scores(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let resolved = self.search(query, k).await?;
        let missing = resolved.iter().filter(|(_, score)| score.is_none()).count();
        if missing > 0 {
            warn!(missing, "vector index did not report scores; substituting 0.0");
        }
        Ok(resolved
            .into_iter()
            .map(|(document, score)| ScoredDocument { document, score: score.unwrap_or(0.0) })
            .collect())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<(Arc<Document>, Option<f32>)>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedding_provider.embed(query).await?;
        let neighbors = self.index.search(&embedding, k).await?;

        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors.into_iter().take(k) {
            if let (Some(min), Some(score)) = (self.min_similarity, neighbor.score) {
                if score < min {
                    debug!(position = neighbor.position, score, min, "skipping low-similarity hit");
                    continue;
                }
            }
            let Some(id) = self.store.id_at(neighbor.position) else {
                debug!(position = neighbor.position, "skipping unmapped index position");
                continue;
            };
            let Some(document) = self.store.get(id) else {
                debug!(position = neighbor.position, id, "skipping unresolvable document id");
                continue;
            };
            if seen.insert(document.id.clone()) {
                resolved.push((document, neighbor.score));
            }
        }

        debug!(requested = k, returned = resolved.len(), "retrieval completed");
        Ok(resolved)
    }

    /// Join document contents into a context of at most `max_total_chars` characters.
    ///
    /// See [`Retriever::assemble_context`] for the inclusion rules.
    pub fn context_string(docs: &[Arc<Document>], max_total_chars: usize) -> String {
        Self::assemble_context(docs, max_total_chars).text
    }

    /// Join document contents and report which documents were included.
    ///
    /// Documents are visited in rank order. Whitespace-only documents are
    /// skipped; others are trimmed and joined with a blank line. Assembly
    /// stops at the first document whose content, plus its separator, would
    /// take the total past `max_total_chars`; documents are never cut.
    pub fn assemble_context(docs: &[Arc<Document>], max_total_chars: usize) -> AssembledContext {
        let separator_chars = CONTEXT_SEPARATOR.chars().count();
        let mut assembled = AssembledContext::default();
        let mut total = 0usize;

        for document in docs {
            let text = document.content.trim();
            if text.is_empty() {
                continue;
            }

            let separator = if assembled.documents.is_empty() { 0 } else { separator_chars };
            let added = separator + text.chars().count();
            if total + added > max_total_chars {
                break;
            }

            if separator > 0 {
                assembled.text.push_str(CONTEXT_SEPARATOR);
            }
            assembled.text.push_str(text);
            assembled.documents.push(Arc::clone(document));
            total += added;
        }

        assembled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ProductCategory;

    fn doc(id: &str, content: &str) -> Arc<Document> {
        Arc::new(Document::new(id, content, id, ProductCategory::CreditCard))
    }

    #[test]
    fn joins_with_blank_line_and_skips_blank_documents() {
        let docs = vec![doc("a", " first "), doc("b", "   "), doc("c", "second")];
        let assembled = Retriever::assemble_context(&docs, 100);
        assert_eq!(assembled.text, "first\n\nsecond");
        let ids: Vec<_> = assembled.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn stops_at_first_document_over_budget() {
        let docs = vec![doc("a", "aaaa"), doc("b", "bbbbbbbbbb"), doc("c", "cc")];
        // "aaaa" (4) fits; "\n\nbbbbbbbbbb" (12) would reach 16 > 10, so assembly stops.
        assert_eq!(Retriever::context_string(&docs, 10), "aaaa");
    }

    #[test]
    fn empty_when_nothing_fits() {
        let docs = vec![doc("a", "far too long for the budget")];
        assert_eq!(Retriever::context_string(&docs, 5), "");
        assert_eq!(Retriever::context_string(&[], 5), "");
    }
}
