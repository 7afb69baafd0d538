//! HTTP API: streaming chat with per-request cancellation

pub mod handlers;
pub mod routes;
pub mod server;
pub mod session;
pub mod types;

pub use handlers::AppState;
pub use server::build_app;
pub use server::build_gateway;
pub use server::serve_api;
pub use session::StreamRegistry;
pub use session::StreamSession;
