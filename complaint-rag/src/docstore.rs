//! Document store: resolves index positions and document ids to excerpts.

use std::collections::HashMap;
use std::sync::Arc;

use crate::document::Document;

/// Read-only lookup from document id to [`Document`].
pub trait DocumentStore: Send + Sync {
    /// Look up a document by id. `None` marks a dangling reference.
    fn get(&self, id: &str) -> Option<Arc<Document>>;

    /// Map an index position to the document id stored at that position.
    fn id_at(&self, position: usize) -> Option<&str>;

    /// Number of documents held.
    fn len(&self) -> usize;

    /// Whether the store holds no documents.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`DocumentStore`] backed by two `HashMap`s: position → id and id → document.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    positions: HashMap<usize, String>,
    documents: HashMap<String, Arc<Document>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an explicit position mapping and document set.
    ///
    /// Mapping entries whose id is missing from `documents` are kept; they are
    /// skipped at retrieval time.
    pub fn from_parts(
        positions: HashMap<usize, String>,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        let documents = documents.into_iter().map(|d| (d.id.clone(), Arc::new(d))).collect();
        Self { positions, documents }
    }

    /// Build a store where the n-th document sits at index position n.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut store = Self::new();
        for (position, document) in documents.into_iter().enumerate() {
            store.positions.insert(position, document.id.clone());
            store.documents.insert(document.id.clone(), Arc::new(document));
        }
        store
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, id: &str) -> Option<Arc<Document>> {
        self.documents.get(id).cloned()
    }

    fn id_at(&self, position: usize) -> Option<&str> {
        self.positions.get(&position).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
