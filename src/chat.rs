//! Chat gateway: augments the latest user turn and relays the model's tokens

use std::sync::Arc;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::DocChatError;
use crate::errors::Result;
use crate::llm::ChatModel;
use crate::llm::GenerationParams;
use crate::models::ChatMessage;
use crate::rag::RagService;

/// Answer text as it is generated; ends early on cancellation or error
pub type ReplyStream = BoxStream<'static, String>;

pub struct ChatGateway {
    rag: Arc<RagService>,
    llm: Arc<dyn ChatModel>,
    params: GenerationParams,
    system_prompt: Option<String>,
}

impl ChatGateway {
    pub fn new(rag: Arc<RagService>, llm: Arc<dyn ChatModel>, params: GenerationParams) -> Self {
        Self {
            rag,
            llm,
            params,
            system_prompt: None,
        }
    }

    pub fn from_config(config: &AppConfig, rag: Arc<RagService>, llm: Arc<dyn ChatModel>) -> Self {
        Self::new(rag, llm, GenerationParams::chat(config))
            .with_system_prompt(config.llm.system_prompt.clone())
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt.filter(|p| !p.trim().is_empty());
        self
    }

    #[must_use]
    pub fn rag(&self) -> &RagService {
        &self.rag
    }

    /// Replace the last turn's content with its RAG prompt and prepend the system message
    ///
    /// # Errors
    /// - `InvalidRequest` when `messages` is empty
    /// - Retrieval failures from [`RagService::create_prompt`]
    pub async fn prepare_messages(&self, mut messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>> {
        let last = messages
            .last_mut()
            .ok_or_else(|| DocChatError::InvalidRequest("No messages".to_string()))?;
        last.content = self.rag.create_prompt(&last.content).await?;

        if let Some(system_prompt) = &self.system_prompt {
            messages.insert(0, ChatMessage::system(system_prompt.clone()));
        }
        Ok(messages)
    }

    /// Stream the answer to `messages` until it completes, fails or `cancel` fires.
    ///
    /// Failures are logged and end the stream; nothing is yielded after
    /// `cancel` is observed, including while retrieval is still running.
    pub fn send_message(self: Arc<Self>, messages: Vec<ChatMessage>, cancel: CancellationToken) -> ReplyStream {
        Box::pin(stream! {
            let prepared = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("Stream cancelled during retrieval");
                    return;
                }
                prepared = self.prepare_messages(messages) => prepared,
            };
            let prepared = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    error!("Failed to build prompt: {}", e);
                    return;
                }
            };

            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("Stream cancelled before generation");
                    return;
                }
                response = self.llm.stream(&prepared, &self.params) => response,
            };
            let mut tokens = match response {
                Ok(response) => response.into_stream(),
                Err(e) => {
                    error!("Failed to start completion stream: {}", e);
                    return;
                }
            };

            let mut relayed = 0usize;
            loop {
                let next = tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        info!("Stream cancelled after {} tokens", relayed);
                        break;
                    }
                    next = tokens.next() => next,
                };

                match next {
                    Some(Ok(token)) => {
                        if cancel.is_cancelled() {
                            info!("Stream cancelled after {} tokens", relayed);
                            break;
                        }
                        relayed += 1;
                        yield token;
                    }
                    Some(Err(e)) => {
                        error!("Completion stream failed after {} tokens: {}", relayed, e);
                        break;
                    }
                    None => {
                        debug!("Completion stream finished ({} tokens)", relayed);
                        break;
                    }
                }
            }
        })
    }
}
