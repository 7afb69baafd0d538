//! Document ingestion: load, split, embed and index
//!
//! Vector mode indexes the split chunks directly. Parent mode stores each
//! chunk as a parent in the docstore and indexes smaller child chunks that
//! point back to it, for use with the parent-document retriever.

pub mod loader;
pub mod splitter;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

pub use loader::load_path;
pub use splitter::TextSplitter;

use crate::config::AppConfig;
use crate::config::RetrievalMode;
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::models::Document;
use crate::rag::retriever::PARENT_ID_KEY;
use crate::store::DocStore;
use crate::store::VectorStore;

/// Chunks sent per embedding request
const EMBED_BATCH_SIZE: usize = 64;

/// Counts from one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub parents: usize,
    pub chunks: usize,
}

pub struct Ingestor {
    store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    parents: Option<(Arc<DocStore>, TextSplitter)>,
}

impl Ingestor {
    /// Index split chunks directly
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn Embedder>, splitter: TextSplitter) -> Self {
        Self {
            store,
            embedder,
            splitter,
            parents: None,
        }
    }

    /// Store chunks as parents and index their children instead
    #[must_use]
    pub fn with_parents(mut self, docstore: Arc<DocStore>, child_splitter: TextSplitter) -> Self {
        self.parents = Some((docstore, child_splitter));
        self
    }

    /// Open the stores under `store.persist_dir` for the configured retrieval mode
    pub fn from_config(config: &AppConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let persist_dir = config.persist_dir();
        let store = Arc::new(VectorStore::open_or_create(persist_dir)?);
        let ingestor = Self::new(store, embedder, TextSplitter::new(config.store.chunk_size));

        Ok(match config.retrieval.mode {
            RetrievalMode::Vector => ingestor,
            RetrievalMode::Parent => ingestor.with_parents(
                Arc::new(DocStore::open_or_create(persist_dir)?),
                TextSplitter::new(config.store.child_chunk_size),
            ),
        })
    }

    /// Empty the index (and docstore, in parent mode)
    pub fn reset(&self) -> Result<()> {
        self.store.clear()?;
        if let Some((docstore, _)) = &self.parents {
            docstore.clear()?;
        }
        info!("Index reset");
        Ok(())
    }

    pub fn index_len(&self) -> usize {
        self.store.len()
    }

    pub async fn ingest_paths(&self, paths: &[PathBuf]) -> Result<IngestReport> {
        let mut documents = Vec::new();
        for path in paths {
            let loaded = load_path(path)?;
            info!("Loaded {} documents from {}", loaded.len(), path.display());
            documents.extend(loaded);
        }
        self.ingest_documents(documents).await
    }

    pub async fn ingest_documents(&self, documents: Vec<Document>) -> Result<IngestReport> {
        let mut report = IngestReport {
            documents: documents.len(),
            ..IngestReport::default()
        };
        let chunks = self.splitter.split_documents(&documents);

        let to_index = match &self.parents {
            None => chunks,
            Some((docstore, child_splitter)) => {
                let mut parents = Vec::with_capacity(chunks.len());
                let mut children = Vec::new();
                for parent in chunks {
                    let parent_id = Uuid::new_v4().to_string();
                    children.extend(
                        child_splitter
                            .split_documents(std::slice::from_ref(&parent))
                            .into_iter()
                            .map(|child| child.with_metadata(PARENT_ID_KEY, parent_id.clone())),
                    );
                    parents.push((parent_id, parent));
                }
                report.parents = parents.len();
                docstore.mset(parents)?;
                children
            }
        };

        report.chunks = self.index(to_index).await?;
        info!(
            "Ingested {} documents: {} parents, {} indexed chunks ({} total in index)",
            report.documents,
            report.parents,
            report.chunks,
            self.store.len()
        );
        Ok(report)
    }

    /// Embed in batches, then write the whole run to the index at once
    async fn index(&self, chunks: Vec<Document>) -> Result<usize> {
        let total = chunks.len();
        if total == 0 {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|d| d.page_content.clone()).collect();
        let mut embeddings = Vec::with_capacity(total);
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            embeddings.extend(self.embedder.embed_documents(batch).await?);
            info!("Embedded {}/{} chunks", embeddings.len(), total);
        }

        self.store.add(chunks, embeddings)?;
        Ok(total)
    }
}
