//! Terminal output for the `docchat` CLI

use crate::ingest::IngestReport;
use crate::AppConfig;

/// Cut `s` to `max_chars` characters, marking the cut with "..."
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}

/// Print generated search queries
pub fn print_queries(question: &str, queries: &[String]) {
    println!("🔍 Queries for \"{}\":", truncate_str(question, 80));
    if queries.is_empty() {
        println!("  (none)");
    }
    for (idx, query) in queries.iter().enumerate() {
        println!("  {}. {}", idx + 1, query);
    }
}

/// Print ingestion totals
pub fn print_ingest_report(report: &IngestReport, index_size: usize) {
    println!("📚 Documents loaded: {}", report.documents);
    if report.parents > 0 {
        println!("🗂️  Parent chunks stored: {}", report.parents);
    }
    println!("🧩 Chunks indexed: {}", report.chunks);
    println!("📦 Index size: {}", index_size);
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 docchat Configuration:");
    println!();

    println!("🌐 Server:");
    println!("  Bind: {}", config.bind_addr());
    println!("  CORS: {}", config.server.cors);
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!("  Directory: {}", config.logging.dir.display());
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Key: {}", mask_key(config.llm_key()));
    println!("  Model: {}", config.llm_model());
    println!("  Temperature: {}", config.llm.temperature);
    println!(
        "  System prompt: {}",
        config
            .llm
            .system_prompt
            .as_deref()
            .map_or_else(|| "(none)".to_string(), |p| truncate_str(p, 60))
    );
    println!();

    println!("🔀 Query generation:");
    println!("  Model: {}", config.query_model());
    println!("  Max queries: {}", config.query_generation.max_queries);
    println!("  Max tokens: {}", config.query_generation.max_tokens);
    println!("  Include original: {}", config.query_generation.include_original);
    println!("  Concurrency: {}", config.query_generation.concurrency);
    println!();

    println!("🧠 Embeddings:");
    println!("  Endpoint: {}", config.embedding_endpoint());
    println!("  Key: {}", mask_key(config.embedding_key()));
    println!("  Model: {}", config.embedding_model());
    println!("  Batch size: {}", config.embeddings.batch_size);
    println!();

    println!("🗄️  Store:");
    println!("  Directory: {}", config.persist_dir().display());
    println!("  Retrieval: {:?} (k={})", config.retrieval.mode, config.retrieval.top_k);
    println!(
        "  Chunk size: {} (children: {})",
        config.store.chunk_size, config.store.child_chunk_size
    );
}

/// Mask an API key for display, keeping a short prefix
fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let prefix: String = key.chars().take(3).collect();
    format!("{prefix}***")
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
