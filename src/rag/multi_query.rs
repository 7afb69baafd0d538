//! Multi-query retrieval: rewrite, fan out, deduplicate

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use futures::TryStreamExt;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::llm::prompts::NOT_CODING_MARKER;
use crate::llm::ChatModel;
use crate::llm::DocPrompts;
use crate::llm::GenerationParams;
use crate::llm::PromptTemplate;
use crate::models::ChatMessage;
use crate::models::Document;
use crate::rag::Retriever;

/// Split model output into queries: one per non-blank line, trimmed
#[must_use]
pub fn parse_lines(text: &str) -> Vec<String> {
    text.trim()
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Union of documents by exact `page_content`, first occurrence wins
#[must_use]
pub fn unique_documents(documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|doc| seen.insert(doc.page_content.clone()))
        .collect()
}

/// Expands a question into several queries and retrieves for all of them
pub struct MultiQueryRetriever {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn ChatModel>,
    params: GenerationParams,
    prompt: PromptTemplate,
    max_queries: usize,
    include_original: bool,
    concurrency: usize,
}

impl MultiQueryRetriever {
    pub fn new(retriever: Arc<dyn Retriever>, llm: Arc<dyn ChatModel>, params: GenerationParams) -> Self {
        Self {
            retriever,
            llm,
            params,
            prompt: DocPrompts::multi_query(),
            max_queries: 5,
            include_original: false,
            concurrency: 5,
        }
    }

    /// Build with the query-generation settings from config
    pub fn from_config(config: &AppConfig, retriever: Arc<dyn Retriever>, llm: Arc<dyn ChatModel>) -> Self {
        let qg = &config.query_generation;
        Self::new(retriever, llm, GenerationParams::query_generation(config))
            .with_max_queries(qg.max_queries)
            .with_include_original(qg.include_original)
            .with_concurrency(qg.concurrency)
    }

    #[must_use]
    pub fn with_max_queries(mut self, max_queries: usize) -> Self {
        self.max_queries = max_queries.max(1);
        self
    }

    #[must_use]
    pub fn with_include_original(mut self, include_original: bool) -> Self {
        self.include_original = include_original;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Every line of the rewrite model's answer, unbounded
    async fn rewrite(&self, question: &str) -> Result<Vec<String>> {
        let prompt = self.prompt.format(&[("question", question)]);
        let text = self
            .llm
            .complete(&[ChatMessage::user(prompt)], &self.params)
            .await?;
        Ok(parse_lines(&text))
    }

    /// Reformulations of `question`, at most `max_queries`
    pub async fn generate_queries(&self, question: &str) -> Result<Vec<String>> {
        let mut queries = self.rewrite(question).await?;
        queries.truncate(self.max_queries);
        Ok(queries)
    }

    /// Run every query against the inner retriever, results kept in query order
    pub async fn retrieve_documents(&self, queries: &[String]) -> Result<Vec<Document>> {
        let per_query: Vec<Vec<Document>> = stream::iter(queries.to_vec())
            .map(|query| {
                let retriever = Arc::clone(&self.retriever);
                async move { retriever.retrieve(&query).await }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(per_query.into_iter().flatten().collect())
    }
}

#[async_trait]
impl Retriever for MultiQueryRetriever {
    /// Empty when the rewrite model flags the question as off-topic
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>> {
        let mut queries = self.rewrite(question).await?;
        if queries.iter().any(|q| q.contains(NOT_CODING_MARKER)) {
            info!("Question is not coding related, skipping retrieval");
            return Ok(Vec::new());
        }

        queries.truncate(self.max_queries);
        if self.include_original {
            queries.insert(0, question.to_string());
        }
        debug!("Generated queries: {:?}", queries);

        let documents = self.retrieve_documents(&queries).await?;
        let total = documents.len();
        let unique = unique_documents(documents);
        info!(
            "Retrieved {} documents for {} queries ({} unique)",
            total,
            queries.len(),
            unique.len()
        );
        Ok(unique)
    }
}
