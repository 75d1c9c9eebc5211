//! Data types for complaint excerpts and retrieval results.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::category::ProductCategory;

/// Provenance attached to every complaint excerpt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    /// Identifier of the complaint this excerpt was cut from.
    pub complaint_id: String,
    /// Product family the complaint was filed against.
    pub product_category: ProductCategory,
    /// Free-text provenance note, e.g. `"This chunk came from complaint 42, product Credit Card."`.
    pub source: String,
}

/// A complaint excerpt as stored in the [`DocumentStore`](crate::DocumentStore).
///
/// Documents are immutable once loaded. Retrieval hands out `Arc<Document>`
/// so results reference the store's copy instead of cloning content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier inside the document store.
    pub id: String,
    /// The excerpt text.
    pub content: String,
    /// Provenance of the excerpt.
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document with a provenance note derived from the complaint id and category.
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        complaint_id: impl Into<String>,
        product_category: ProductCategory,
    ) -> Self {
        let complaint_id = complaint_id.into();
        let source =
            format!("This chunk came from complaint {complaint_id}, product {product_category}.");
        Self {
            id: id.into(),
            content: content.into(),
            metadata: DocumentMetadata { complaint_id, product_category, source },
        }
    }
}

/// Documents returned by [`Retriever::retrieve`](crate::Retriever::retrieve).
///
/// Ordered by similarity rank (best first), with no duplicate ids.
pub type RetrievalResult = Vec<Arc<Document>>;

/// A retrieved document paired with its similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    /// The retrieved document.
    pub document: Arc<Document>,
    /// The similarity score (higher is more relevant).
    ///
    /// `0.0` for every document when the index does not report scores.
    pub score: f32,
}
