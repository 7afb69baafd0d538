//! LLM access: chat completions, token streaming and prompt templates

pub mod prompts;
pub mod service;
pub mod streaming;

use async_trait::async_trait;

pub use prompts::DocPrompts;
pub use prompts::PromptTemplate;
pub use service::LlmService;
pub use streaming::StreamingResponse;
pub use streaming::TokenStream;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::ChatMessage;

/// Sampling parameters sent with a completion request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
}

impl GenerationParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
        }
    }

    /// Parameters for the answer stream
    #[must_use]
    pub fn chat(config: &AppConfig) -> Self {
        Self {
            temperature: Some(config.llm.temperature),
            ..Self::new(config.llm_model())
        }
    }

    /// Deterministic parameters for the query-rewrite call
    #[must_use]
    pub fn query_generation(config: &AppConfig) -> Self {
        let qg = &config.query_generation;
        Self {
            model: config.query_model().to_string(),
            temperature: Some(qg.temperature),
            max_tokens: Some(qg.max_tokens),
            top_p: Some(qg.top_p),
            frequency_penalty: Some(qg.frequency_penalty),
            presence_penalty: Some(qg.presence_penalty),
        }
    }
}

/// A hosted chat-completion model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run a completion and return the full assistant text
    async fn complete(&self, messages: &[ChatMessage], params: &GenerationParams)
        -> Result<String>;

    /// Open a completion that yields text as it is generated
    async fn stream(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<StreamingResponse>;
}
