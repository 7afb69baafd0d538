//! OpenAI-compatible chat completion client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::DocChatError;
use crate::errors::Result;
use crate::llm::streaming::sse_token_stream;
use crate::llm::ChatModel;
use crate::llm::GenerationParams;
use crate::llm::StreamingResponse;
use crate::models::ChatMessage;

/// Client for `/chat/completions` on an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct LlmService {
    endpoint: String,
    api_key: String,
    client: Client,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

impl<'a> CompletionRequest<'a> {
    fn new(messages: &'a [ChatMessage], params: &'a GenerationParams, stream: bool) -> Self {
        Self {
            model: &params.model,
            messages,
            stream,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmService {
    /// Create a new LLM service from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_client(
            config.llm_endpoint(),
            config.llm_key(),
            client,
        ))
    }

    /// Create from an existing HTTP client
    pub fn with_client(endpoint: &str, api_key: &str, client: Client) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    async fn send(&self, body: &CompletionRequest<'_>) -> Result<reqwest::Response> {
        let url = self.completions_url();
        debug!(
            "Calling chat completions: {} (model {}, stream {})",
            url, body.model, body.stream
        );

        let mut request = self.client.post(&url).json(body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DocChatError::LlmError(format!(
                "Chat API error ({status}): {error_text}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for LlmService {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String> {
        let body = CompletionRequest::new(messages, params, false);
        let response = self.send(&body).await?;

        let result: CompletionResponse = response
            .json()
            .await
            .map_err(|e| DocChatError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| DocChatError::LlmError("No choices in response".to_string()))
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<StreamingResponse> {
        let body = CompletionRequest::new(messages, params, true);
        let response = self.send(&body).await?;
        Ok(StreamingResponse::new(sse_token_stream(
            response.bytes_stream(),
        )))
    }
}
