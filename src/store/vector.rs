use std::path::Path;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

use crate::errors::DocChatError;
use crate::errors::Result;
use crate::models::Document;
use crate::store::write_atomic;

const VECTORS_FILE: &str = "vectors.json";

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    id: Uuid,
    document: Document,
    embedding: Vec<f32>,
}

/// A search hit with its cosine similarity
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// In-memory vector store with disk persistence and cosine similarity search.
pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    persist_path: PathBuf,
}

impl VectorStore {
    pub fn open_or_create(persist_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(persist_dir)?;
        let persist_path = persist_dir.join(VECTORS_FILE);

        let entries: Vec<VectorEntry> = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)?;
            serde_json::from_str(&data)?
        } else {
            Vec::new()
        };

        info!(
            "Vector store opened at {} ({} entries)",
            persist_path.display(),
            entries.len()
        );

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path,
        })
    }

    /// Add documents with their embeddings. `embeddings` must be parallel with `documents`.
    pub fn add(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<Vec<Uuid>> {
        if documents.len() != embeddings.len() {
            return Err(DocChatError::StoreError(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }

        let mut entries = self.entries.write();
        let dimension = entries.first().map(|e| e.embedding.len());
        if let Some(bad) = embeddings
            .iter()
            .find(|e| e.is_empty() || dimension.is_some_and(|d| d != e.len()))
        {
            return Err(DocChatError::StoreError(format!(
                "Embedding dimension {} does not match index dimension {}",
                bad.len(),
                dimension.unwrap_or(0)
            )));
        }

        let committed = entries.len();
        let ids: Vec<Uuid> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| {
                let id = Uuid::new_v4();
                entries.push(VectorEntry {
                    id,
                    document,
                    embedding,
                });
                id
            })
            .collect();

        // memory and disk stay in step: undo the push if the write fails
        let persisted = serde_json::to_string(&*entries)
            .map_err(DocChatError::from)
            .and_then(|data| write_atomic(&self.persist_path, &data));
        if let Err(e) = persisted {
            entries.truncate(committed);
            return Err(e);
        }
        debug!("Added {} vectors ({} total)", ids.len(), entries.len());

        Ok(ids)
    }

    /// Top-`k` documents by cosine similarity, best first
    pub fn similarity_search_by_vector(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredDocument> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, e)| ScoredDocument {
                document: e.document.clone(),
                score,
            })
            .collect()
    }

    /// Drop every entry and persist the empty index
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write();
        entries.clear();
        write_atomic(&self.persist_path, "[]")
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new(text)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store
            .add(
                vec![doc("useState"), doc("useEffect"), doc("JSX")],
                vec![vec![1.0, 0.0], vec![0.7, 0.7], vec![0.0, 1.0]],
            )
            .unwrap();

        let hits = store.similarity_search_by_vector(&[1.0, 0.1], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.page_content, "useState");
        assert_eq!(hits[1].document.page_content, "useEffect");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = VectorStore::open_or_create(dir.path()).unwrap();
            store
                .add(
                    vec![doc("a").with_metadata("source", "a.md")],
                    vec![vec![0.1, 0.2, 0.3]],
                )
                .unwrap();
        }

        let reopened = VectorStore::open_or_create(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        let hits = reopened.similarity_search_by_vector(&[0.1, 0.2, 0.3], 4);
        assert_eq!(hits[0].document.metadata_str("source"), Some("a.md"));
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store.add(vec![doc("a")], vec![vec![1.0, 0.0]]).unwrap();

        let err = store.add(vec![doc("b")], vec![vec![1.0, 0.0, 0.0]]);
        assert!(matches!(err, Err(DocChatError::StoreError(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejects_unparallel_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        assert!(store.add(vec![doc("a"), doc("b")], vec![vec![1.0]]).is_err());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store.add(vec![doc("a")], vec![vec![1.0]]).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(VectorStore::open_or_create(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_leaves_index_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("index");
        let store = VectorStore::open_or_create(&index_dir).unwrap();
        store.add(vec![doc("kept")], vec![vec![1.0, 0.0]]).unwrap();

        std::fs::remove_dir_all(&index_dir).unwrap();
        assert!(store.add(vec![doc("lost")], vec![vec![0.0, 1.0]]).is_err());

        assert_eq!(store.len(), 1);
        let hits = store.similarity_search_by_vector(&[0.0, 1.0], 4);
        assert_eq!(hits[0].document.page_content, "kept");
    }

    #[test]
    fn test_empty_store_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        assert!(store.similarity_search_by_vector(&[1.0], 4).is_empty());
    }
}
