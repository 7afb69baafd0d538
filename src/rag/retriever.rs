//! Vector-index retrievers

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::models::Document;
use crate::rag::Retriever;
use crate::store::DocStore;
use crate::store::VectorStore;

/// Metadata key linking a child chunk to its parent in the docstore
pub const PARENT_ID_KEY: &str = "parent_id";

/// Top-k similarity search over the vector index
pub struct VectorRetriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl VectorRetriever {
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self { store, embedder, k }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let embedding = self.embedder.embed_query(query).await?;
        let hits = self.store.similarity_search_by_vector(&embedding, self.k);
        debug!("Vector search for {:?}: {} hits", query, hits.len());
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }
}

/// Searches small child chunks, returns the larger parents they were cut from
pub struct ParentDocumentRetriever {
    children: VectorRetriever,
    docstore: Arc<DocStore>,
}

impl ParentDocumentRetriever {
    pub fn new(
        store: Arc<VectorStore>,
        docstore: Arc<DocStore>,
        embedder: Arc<dyn Embedder>,
        k: usize,
    ) -> Self {
        Self {
            children: VectorRetriever::new(store, embedder, k),
            docstore,
        }
    }
}

#[async_trait]
impl Retriever for ParentDocumentRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let children = self.children.retrieve(query).await?;

        let mut seen = HashSet::new();
        let parent_ids: Vec<String> = children
            .iter()
            .filter_map(|child| child.metadata_str(PARENT_ID_KEY))
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect();

        let parents: Vec<Document> = self.docstore.mget(&parent_ids).into_iter().flatten().collect();
        debug!(
            "Parent search for {:?}: {} children -> {} parents",
            query,
            children.len(),
            parents.len()
        );
        Ok(parents)
    }
}
