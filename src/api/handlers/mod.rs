/// API request handlers
use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::session::StreamRegistry;
use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::chat::ChatGateway;

pub mod chat;

pub use chat::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ChatGateway>,
    pub streams: StreamRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: Arc<ChatGateway>) -> Self {
        Self {
            gateway,
            streams: StreamRegistry::new(),
        }
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_streams: state.streams.active_count(),
    }))
}
