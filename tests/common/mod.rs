#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use docchat::chat::ChatGateway;
use docchat::embeddings::Embedder;
use docchat::ingest::Ingestor;
use docchat::ingest::TextSplitter;
use docchat::llm::ChatModel;
use docchat::llm::GenerationParams;
use docchat::llm::StreamingResponse;
use docchat::models::ChatMessage;
use docchat::models::Document;
use docchat::rag::MultiQueryRetriever;
use docchat::rag::RagService;
use docchat::rag::VectorRetriever;
use docchat::store::VectorStore;
use docchat::DocChatError;
use docchat::Result;
use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::Mutex;

/// Rewrites with a fixed answer and streams fixed tokens
pub struct FakeModel {
    pub rewrite: String,
    pub tokens: Vec<String>,
    pub hang: bool,
    pub streamed: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeModel {
    pub fn new(rewrite: &str, tokens: &[&str]) -> Self {
        Self {
            rewrite: rewrite.to_string(),
            tokens: tokens.iter().map(|t| (*t).to_string()).collect(),
            hang: false,
            streamed: Mutex::new(Vec::new()),
        }
    }

    /// Keep the stream open after the scripted tokens
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn last_streamed(&self) -> Option<Vec<ChatMessage>> {
        self.streamed.lock().last().cloned()
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, _messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
        if self.rewrite.is_empty() {
            return Err(DocChatError::LlmError("rewrite unavailable".to_string()));
        }
        Ok(self.rewrite.clone())
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        _params: &GenerationParams,
    ) -> Result<StreamingResponse> {
        self.streamed.lock().push(messages.to_vec());
        let head = stream::iter(self.tokens.clone().into_iter().map(Ok));
        let tail: BoxStream<'static, Result<String>> = if self.hang {
            stream::pending().boxed()
        } else {
            stream::empty().boxed()
        };
        Ok(StreamingResponse::new(Box::pin(head.chain(tail))))
    }
}

/// Keyword-count embedding over a small React vocabulary
pub struct TopicEmbedder;

const TOPICS: [&str; 6] = ["state", "effect", "jsx", "context", "ref", "form"];

#[async_trait]
impl Embedder for TopicEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(topic_vector(text))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| topic_vector(t)).collect())
    }
}

fn topic_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    TOPICS.iter().map(|t| lower.matches(t).count() as f32).collect()
}

/// A vector index under `dir` holding `docs`, one chunk each
pub async fn seeded_store(dir: &Path, docs: &[&str]) -> Arc<VectorStore> {
    let store = Arc::new(VectorStore::open_or_create(dir).unwrap());
    let ingestor = Ingestor::new(store.clone(), Arc::new(TopicEmbedder), TextSplitter::new(10_000));
    ingestor
        .ingest_documents(docs.iter().map(|d| Document::new(*d)).collect())
        .await
        .unwrap();
    store
}

pub fn rag_service(store: Arc<VectorStore>, model: Arc<FakeModel>, k: usize) -> RagService {
    let retriever = Arc::new(VectorRetriever::new(store, Arc::new(TopicEmbedder), k));
    RagService::from_retriever(MultiQueryRetriever::new(
        retriever,
        model,
        GenerationParams::new("fake-model"),
    ))
}

pub fn gateway(store: Arc<VectorStore>, model: Arc<FakeModel>) -> Arc<ChatGateway> {
    let rag = Arc::new(rag_service(store, model.clone(), 2));
    Arc::new(ChatGateway::new(rag, model, GenerationParams::new("fake-model")))
}
