/// Streaming chat handlers
use std::convert::Infallible;

use axum::body::Body;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use tracing::info;
use tracing::warn;

use super::AppState;
use crate::api::types::ApiResponse;
use crate::api::types::StopStreamRequest;
use crate::api::types::StopStreamResponse;
use crate::api::types::StreamChatRequest;

/// Response header carrying the id accepted by `/stop_stream/`
pub const STREAM_ID_HEADER: HeaderName = HeaderName::from_static("x-stream-id");

/// Stream an answer (POST /stream_chat/)
pub async fn stream_chat(State(state): State<AppState>, Json(req): Json<StreamChatRequest>) -> Response {
    if req.messages.is_empty() {
        warn!("POST /stream_chat/ with no messages");
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("messages must not be empty")),
        )
            .into_response();
    }

    let session = state.streams.register();
    let stream_id = session.id().to_string();
    info!("POST /stream_chat/ [{}]: {} messages", stream_id, req.messages.len());

    let mut tokens = state.gateway.clone().send_message(req.messages, session.token());
    // the session lives as long as the body, so disconnects deregister it too
    let body = async_stream::stream! {
        let _session = session;
        while let Some(token) = tokens.next().await {
            yield Ok::<_, Infallible>(token);
        }
    };

    (
        [
            (header::CONTENT_TYPE, "text/event-stream".to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
            (STREAM_ID_HEADER, stream_id),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// Stop one stream or all of them (POST /stop_stream/)
pub async fn stop_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        StopStreamRequest::default()
    } else {
        match serde_json::from_slice::<StopStreamRequest>(&body) {
            Ok(req) => req,
            Err(e) => {
                warn!("Invalid stop request: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<()>::error(format!("Invalid request body: {e}"))),
                )
                    .into_response();
            }
        }
    };

    let stopped = match req.stream_id.as_deref() {
        Some(stream_id) => {
            info!("POST /stop_stream/ [{}]", stream_id);
            usize::from(state.streams.cancel(stream_id))
        }
        None => {
            info!("POST /stop_stream/ (all streams)");
            state.streams.cancel_all()
        }
    };

    Json(StopStreamResponse::stopping(stopped)).into_response()
}
