//! Text embeddings for indexing and query lookup

pub mod client;

use async_trait::async_trait;

pub use client::EmbeddingClient;

use crate::errors::Result;

/// Turns text into vectors for similarity search
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many documents, preserving input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
