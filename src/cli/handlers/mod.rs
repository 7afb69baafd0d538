//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - serve: API server
//! - ingest: Document loading and indexing
//! - rag: Query generation and answering
//! - info: Configuration display

pub mod info;
pub mod ingest;
pub mod rag;
pub mod serve;

// Re-export all public handlers
pub use info::*;
pub use ingest::*;
pub use rag::*;
pub use serve::*;
