pub mod api;
pub mod chat;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AppConfig;
pub use errors::*;
