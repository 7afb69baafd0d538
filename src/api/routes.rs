//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create the chat API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Streaming chat
        .route("/stream_chat/", post(handlers::stream_chat))
        .route("/stop_stream/", post(handlers::stop_stream))
        .with_state(state)
}
