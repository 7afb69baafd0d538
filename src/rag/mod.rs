//! Retrieval-augmented prompting over the indexed documentation
//!
//! A user question is rewritten into several documentation-seeking queries,
//! each query is run against the vector index, the union of the hits is
//! deduplicated and joined into a context block, and the context is rendered
//! into the answer prompt.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docchat::config::AppConfig;
//! use docchat::embeddings::EmbeddingClient;
//! use docchat::llm::LlmService;
//! use docchat::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let llm = Arc::new(LlmService::new(&config)?);
//!     let embedder = Arc::new(EmbeddingClient::new(&config)?);
//!     let service = RagService::from_config(&config, llm, embedder)?;
//!
//!     let prompt = service.create_prompt("How do I fetch data in useEffect?").await?;
//!     println!("{prompt}");
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod multi_query;
pub mod pipeline;
pub mod retriever;

use async_trait::async_trait;

pub use context::ContextAssembler;
pub use multi_query::unique_documents;
pub use multi_query::MultiQueryRetriever;
pub use pipeline::RagService;
pub use retriever::ParentDocumentRetriever;
pub use retriever::VectorRetriever;

use crate::errors::Result;
use crate::models::Document;

/// Anything that can turn a query into relevant documents
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>>;
}
