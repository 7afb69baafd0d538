//! Complete RAG pipeline: Retrieve -> Assemble -> Prompt

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::config::RetrievalMode;
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::llm::ChatModel;
use crate::llm::DocPrompts;
use crate::llm::PromptTemplate;
use crate::rag::ContextAssembler;
use crate::rag::MultiQueryRetriever;
use crate::rag::ParentDocumentRetriever;
use crate::rag::Retriever;
use crate::rag::VectorRetriever;
use crate::store::DocStore;
use crate::store::VectorStore;

/// Turns a user query into the prompt actually sent to the chat model
pub struct RagService {
    retriever: MultiQueryRetriever,
    context_assembler: ContextAssembler,
    answer_prompt: PromptTemplate,
}

impl RagService {
    /// Open the persisted index and wire the retriever selected by `retrieval.mode`
    ///
    /// # Errors
    /// - Store files that exist but cannot be read or parsed
    pub fn from_config(
        config: &AppConfig,
        llm: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let persist_dir = config.persist_dir();
        let store = Arc::new(VectorStore::open_or_create(persist_dir)?);
        let k = config.retrieval.top_k;

        let base: Arc<dyn Retriever> = match config.retrieval.mode {
            RetrievalMode::Vector => Arc::new(VectorRetriever::new(store, embedder, k)),
            RetrievalMode::Parent => {
                let docstore = Arc::new(DocStore::open_or_create(persist_dir)?);
                Arc::new(ParentDocumentRetriever::new(store, docstore, embedder, k))
            }
        };
        info!("RAG service ready ({:?} retrieval, k={})", config.retrieval.mode, k);

        Ok(Self::from_retriever(MultiQueryRetriever::from_config(config, base, llm)))
    }

    /// Create from an existing retriever
    #[must_use]
    pub fn from_retriever(retriever: MultiQueryRetriever) -> Self {
        Self {
            retriever,
            context_assembler: ContextAssembler::default(),
            answer_prompt: DocPrompts::context_qa(),
        }
    }

    #[must_use]
    pub fn multi_query(&self) -> &MultiQueryRetriever {
        &self.retriever
    }

    /// Joined contents of the unique retrieved documents, empty when nothing matched
    pub async fn retrieve_context(&self, query: &str) -> Result<String> {
        let documents = self.retriever.retrieve(query).await?;
        Ok(self.context_assembler.assemble(&documents))
    }

    /// The answer prompt for `query`, or `query` itself when there is no context
    ///
    /// # Errors
    /// - Query rewrite failures from the chat model
    /// - Embedding or store failures during retrieval
    pub async fn create_prompt(&self, query: &str) -> Result<String> {
        let context = self.retrieve_context(query).await?;
        if context.is_empty() {
            debug!("No context retrieved, forwarding query unmodified");
            return Ok(query.to_string());
        }

        Ok(self
            .answer_prompt
            .format(&[("context", context.as_str()), ("question", query)]))
    }
}
