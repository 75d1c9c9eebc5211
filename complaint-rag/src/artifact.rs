//! Loading of the persisted index artifact produced by the offline build job.
//!
//! An artifact directory contains two JSON files:
//!
//! - `index.json`: `{"dimensions": 384, "vectors": [[...], ...]}`, vectors in
//!   index-position order.
//! - `docstore.json`: `{"index_to_docstore_id": {"0": "<id>", ...},
//!   "documents": {"<id>": {"content": "...", "metadata": {...}}, ...}}`.
//!
//! Loading is all-or-nothing: any missing file, parse failure, or dimension
//! mismatch is a [`RagError::ArtifactLoad`]. Mapping entries pointing at
//! absent documents are allowed and skipped at query time.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::docstore::{DocumentStore, InMemoryDocumentStore};
use crate::document::{Document, DocumentMetadata};
use crate::error::{RagError, Result};
use crate::flat::FlatIndex;

/// File name of the vector file inside an artifact directory.
pub const INDEX_FILE: &str = "index.json";

/// File name of the document store file inside an artifact directory.
pub const DOCSTORE_FILE: &str = "docstore.json";

#[derive(Deserialize)]
struct IndexFile {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct DocstoreFile {
    index_to_docstore_id: HashMap<usize, String>,
    documents: HashMap<String, StoredDocument>,
}

#[derive(Deserialize)]
struct StoredDocument {
    content: String,
    metadata: DocumentMetadata,
}

/// A fully loaded index artifact: the vector index plus its document store.
#[derive(Debug)]
pub struct IndexArtifact {
    /// The vector index.
    pub index: FlatIndex,
    /// The position → id → document store.
    pub store: InMemoryDocumentStore,
}

impl IndexArtifact {
    /// Load an artifact directory.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ArtifactLoad`] if either file is missing or
    /// malformed, or if the vectors do not match the declared dimensions.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let index_path = dir.join(INDEX_FILE);
        let docstore_path = dir.join(DOCSTORE_FILE);

        let index_file: IndexFile = read_json(&index_path)?;
        let vector_count = index_file.vectors.len();
        let index = FlatIndex::new(index_file.dimensions, index_file.vectors)
            .map_err(|e| artifact_error(&index_path, e.to_string()))?;

        let docstore_file: DocstoreFile = read_json(&docstore_path)?;
        let dangling = docstore_file
            .index_to_docstore_id
            .values()
            .filter(|id| !docstore_file.documents.contains_key(*id))
            .count();
        if dangling > 0 {
            warn!(dangling, "docstore mapping references missing documents");
        }
        let out_of_range =
            docstore_file.index_to_docstore_id.keys().filter(|p| **p >= vector_count).count();
        if out_of_range > 0 {
            warn!(out_of_range, vector_count, "docstore mapping has positions beyond the index");
        }

        let documents = docstore_file.documents.into_iter().map(|(id, stored)| Document {
            id,
            content: stored.content,
            metadata: stored.metadata,
        });
        let store = InMemoryDocumentStore::from_parts(docstore_file.index_to_docstore_id, documents);

        info!(
            path = %dir.display(),
            vectors = vector_count,
            dimensions = index.dimensions(),
            documents = store.len(),
            "loaded index artifact"
        );

        Ok(Self { index, store })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| artifact_error(path, e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| artifact_error(path, e.to_string()))
}

fn artifact_error(path: &Path, message: String) -> RagError {
    RagError::ArtifactLoad { path: path.display().to_string(), message }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::index::VectorIndex;

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        fs::write(dir.join(name), serde_json::to_string(&value).unwrap()).unwrap();
    }

    #[test]
    fn loads_valid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), INDEX_FILE, json!({"dimensions": 2, "vectors": [[1.0, 0.0], [0.0, 1.0]]}));
        write(
            dir.path(),
            DOCSTORE_FILE,
            json!({
                "index_to_docstore_id": {"0": "a", "1": "missing"},
                "documents": {
                    "a": {
                        "content": "Charged twice for one purchase.",
                        "metadata": {
                            "complaint_id": "101",
                            "product_category": "Credit Card",
                            "source": "This chunk came from complaint 101, product Credit Card."
                        }
                    }
                }
            }),
        );

        let artifact = IndexArtifact::load(dir.path()).unwrap();
        assert_eq!(artifact.index.len(), 2);
        assert_eq!(artifact.store.len(), 1);
        assert_eq!(artifact.store.id_at(1), Some("missing"));
        assert!(artifact.store.get("missing").is_none());
    }

    #[test]
    fn missing_files_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let err = IndexArtifact::load(dir.path()).unwrap_err();
        assert!(matches!(err, RagError::ArtifactLoad { .. }));
        assert!(err.to_string().contains(INDEX_FILE));
    }

    #[test]
    fn dimension_mismatch_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), INDEX_FILE, json!({"dimensions": 3, "vectors": [[1.0, 0.0]]}));
        write(dir.path(), DOCSTORE_FILE, json!({"index_to_docstore_id": {}, "documents": {}}));
        assert!(matches!(IndexArtifact::load(dir.path()), Err(RagError::ArtifactLoad { .. })));
    }

    #[test]
    fn malformed_docstore_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), INDEX_FILE, json!({"dimensions": 2, "vectors": []}));
        fs::write(dir.path().join(DOCSTORE_FILE), "{not json").unwrap();
        let err = IndexArtifact::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(DOCSTORE_FILE));
    }
}
