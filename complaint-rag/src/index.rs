//! Vector index trait for nearest-neighbor search over the persisted corpus.

use async_trait::async_trait;

use crate::error::Result;

/// One hit returned by a [`VectorIndex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Integer position of the vector inside the index. Resolved to a document
    /// id through the artifact's position-to-id mapping.
    pub position: usize,
    /// Similarity score (higher is closer), or `None` when the backend does
    /// not expose distances.
    pub score: Option<f32>,
}

/// A read-only nearest-neighbor index built offline.
///
/// Implementations are loaded once at startup and shared across requests, so
/// `search` must be safe to call concurrently.
///
/// # Example
///
/// ```rust,ignore
/// use complaint_rag::{FlatIndex, VectorIndex};
///
/// let index = FlatIndex::new(384, vectors)?;
/// let hits = index.search(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `k` nearest neighbors of `embedding`, best first.
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Number of vectors stored in the index.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
