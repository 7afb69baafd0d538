//! In-process fakes for the model, embedding and retrieval seams

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::Mutex;

use crate::embeddings::Embedder;
use crate::errors::DocChatError;
use crate::errors::Result;
use crate::llm::ChatModel;
use crate::llm::GenerationParams;
use crate::llm::StreamingResponse;
use crate::models::ChatMessage;
use crate::models::Document;
use crate::rag::Retriever;

/// What the token stream does after its scripted tokens run out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTail {
    End,
    Hang,
    Error,
}

/// Chat model answering with canned text and recording every request
pub struct ScriptedChatModel {
    completion: Option<String>,
    tokens: Vec<String>,
    tail: StreamTail,
    completion_requests: Mutex<Vec<Vec<ChatMessage>>>,
    stream_requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn completing(text: &str) -> Self {
        Self {
            completion: Some(text.to_string()),
            tokens: Vec::new(),
            tail: StreamTail::End,
            completion_requests: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails
    pub fn failing() -> Self {
        Self {
            completion: None,
            tail: StreamTail::Error,
            ..Self::completing("")
        }
    }

    pub fn with_tokens(mut self, tokens: &[&str]) -> Self {
        self.tokens = tokens.iter().map(|t| (*t).to_string()).collect();
        self
    }

    pub fn with_tail(mut self, tail: StreamTail) -> Self {
        self.tail = tail;
        self
    }

    pub fn completion_requests(&self) -> Vec<Vec<ChatMessage>> {
        self.completion_requests.lock().clone()
    }

    pub fn stream_requests(&self) -> Vec<Vec<ChatMessage>> {
        self.stream_requests.lock().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
        self.completion_requests.lock().push(messages.to_vec());
        self.completion
            .clone()
            .ok_or_else(|| DocChatError::LlmError("scripted failure".to_string()))
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        _params: &GenerationParams,
    ) -> Result<StreamingResponse> {
        self.stream_requests.lock().push(messages.to_vec());
        if self.completion.is_none() && self.tokens.is_empty() {
            return Err(DocChatError::LlmError("scripted failure".to_string()));
        }

        let head = stream::iter(self.tokens.clone().into_iter().map(Ok));
        let tail: BoxStream<'static, Result<String>> = match self.tail {
            StreamTail::End => stream::empty().boxed(),
            StreamTail::Hang => stream::pending().boxed(),
            StreamTail::Error => {
                stream::once(async { Err(DocChatError::LlmError("stream broke".to_string())) }).boxed()
            }
        };
        Ok(StreamingResponse::new(Box::pin(head.chain(tail))))
    }
}

/// Embeds text as keyword counts so similarity follows shared topics
pub struct KeywordEmbedder;

const KEYWORDS: [&str; 5] = ["state", "effect", "jsx", "hook", "form"];

impl KeywordEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        KEYWORDS
            .iter()
            .map(|kw| lower.matches(kw).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Fixed query -> documents table
#[derive(Default)]
pub struct StaticRetriever {
    answers: HashMap<String, Vec<Document>>,
    queries: Mutex<Vec<String>>,
}

impl StaticRetriever {
    pub fn with(mut self, query: &str, documents: Vec<Document>) -> Self {
        self.answers.insert(query.to_string(), documents);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        self.queries.lock().push(query.to_string());
        Ok(self.answers.get(query).cloned().unwrap_or_default())
    }
}

/// Never finishes retrieving
pub struct PendingRetriever;

#[async_trait]
impl Retriever for PendingRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Document>> {
        futures::future::pending().await
    }
}

/// Answers each query with one document named after it, after a short delay,
/// and tracks how many calls overlap
#[derive(Default)]
pub struct SlowRetriever {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowRetriever {
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for SlowRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // a higher trailing digit finishes sooner, so completion order differs from query order
        let digit = query.chars().last().and_then(|c| c.to_digit(10)).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(u64::from(50 - 5 * digit.min(9)))).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![Document::new(query)])
    }
}
