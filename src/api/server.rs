//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::api::session::StreamRegistry;
use crate::chat::ChatGateway;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingClient;
use crate::llm::LlmService;
use crate::rag::RagService;
use crate::Result;

/// Wrap the routes in the HTTP middleware stack
pub fn build_app(state: AppState, enable_cors: bool) -> Router {
    let mut app = routes::api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Wire the chat gateway from config
///
/// # Errors
/// - HTTP client construction failures
/// - Unreadable vector index or docstore files
pub fn build_gateway(config: &AppConfig) -> Result<Arc<ChatGateway>> {
    let llm = Arc::new(LlmService::new(config)?);
    let embedder = Arc::new(EmbeddingClient::new(config)?);
    let rag = Arc::new(RagService::from_config(config, llm.clone(), embedder)?);
    Ok(Arc::new(ChatGateway::from_config(config, rag, llm)))
}

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16, enable_cors: bool) -> Result<()> {
    info!("🚀 Starting docchat API server...");

    if config.llm_key().is_empty() {
        warn!("No LLM API key configured; set llm.llm_key or OPENAI_API_KEY");
    }

    let state = AppState::new(build_gateway(config)?);
    let streams = state.streams.clone();
    let app = build_app(state, enable_cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /health        - Health check");
    info!("  POST /stream_chat/  - Stream an answer");
    info!("  POST /stop_stream/  - Stop one or all streams");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(streams))
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, after signalling every open stream so connections can drain
async fn shutdown_signal(streams: StreamRegistry) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down, stopping {} open streams", streams.active_count());
    streams.cancel_all();
}
