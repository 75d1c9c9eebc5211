//! Exact (brute-force) vector index using cosine similarity.
//!
//! [`FlatIndex`] keeps every vector in a position-ordered `Vec` and scores all
//! of them per query. It is the backend loaded from the persisted artifact and
//! is fast enough for corpora in the tens of thousands of chunks.

use async_trait::async_trait;

use crate::error::{RagError, Result};
use crate::index::{Neighbor, VectorIndex};

/// An exact nearest-neighbor index over position-ordered vectors.
///
/// Immutable after construction; concurrent searches need no locking.
///
/// # Example
///
/// ```rust,ignore
/// use complaint_rag::{FlatIndex, VectorIndex};
///
/// let index = FlatIndex::new(3, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]])?;
/// let hits = index.search(&[1.0, 0.1, 0.0], 1).await?;
/// assert_eq!(hits[0].position, 0);
/// ```
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Create an index from vectors whose position is their neighbor id.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorIndex`] if `dimensions` is zero or any vector
    /// has a different length.
    pub fn new(dimensions: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::VectorIndex {
                backend: "Flat".to_string(),
                message: "dimensions must be greater than zero".to_string(),
            });
        }
        if let Some((position, vector)) =
            vectors.iter().enumerate().find(|(_, v)| v.len() != dimensions)
        {
            return Err(RagError::VectorIndex {
                backend: "Flat".to_string(),
                message: format!(
                    "vector at position {position} has {} dimensions, expected {dimensions}",
                    vector.len()
                ),
            });
        }
        Ok(Self { dimensions, vectors })
    }

    /// Dimensionality of the stored vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the result is not finite
/// (e.g. both norms overflow).
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() { similarity } else { 0.0 }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if embedding.len() != self.dimensions {
            return Err(RagError::VectorIndex {
                backend: "Flat".to_string(),
                message: format!(
                    "query has {} dimensions, index expects {}",
                    embedding.len(),
                    self.dimensions
                ),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                score: Some(cosine_similarity(vector, embedding)),
            })
            .collect();

        // Stable sort keeps lower positions first on ties, so results are deterministic.
        let key = |n: &Neighbor| n.score.unwrap_or(f32::NEG_INFINITY);
        scored.sort_by(|a, b| key(b).total_cmp(&key(a)));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}
