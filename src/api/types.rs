//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::ChatMessage;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_streams: usize,
}

/// Chat history; the last message is the one answered
#[derive(Debug, Deserialize)]
pub struct StreamChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Stop one stream by id, or every in-flight stream when no id is given
#[derive(Debug, Default, Deserialize)]
pub struct StopStreamRequest {
    #[serde(default)]
    pub stream_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopStreamResponse {
    pub message: String,
    pub stopped: usize,
}

impl StopStreamResponse {
    #[must_use]
    pub fn stopping(stopped: usize) -> Self {
        Self {
            message: "Stream stopping".to_string(),
            stopped,
        }
    }
}
