//! Document ingestion handlers

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::output::print_ingest_report;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::embeddings::EmbeddingClient;
use crate::ingest::Ingestor;
use crate::AppConfig;
use crate::Result;

pub async fn handle_ingest(config: &AppConfig, paths: Vec<PathBuf>, reset: bool) -> Result<()> {
    let embedder = Arc::new(EmbeddingClient::new(config)?);
    let ingestor = Ingestor::from_config(config, embedder)?;

    if reset {
        ingestor.reset()?;
        print_info(&format!("Cleared index at {}", config.persist_dir().display()));
    }

    print_info(&format!(
        "Ingesting {} path(s) in {:?} mode...",
        paths.len(),
        config.retrieval.mode
    ));
    let report = ingestor.ingest_paths(&paths).await?;

    print_ingest_report(&report, ingestor.index_len());
    print_success("Ingestion complete");
    Ok(())
}
