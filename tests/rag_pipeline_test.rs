mod common;

use std::sync::Arc;

use common::FakeModel;
use common::TopicEmbedder;
use docchat::config::AppConfig;
use docchat::config::RetrievalMode;
use docchat::ingest::Ingestor;
use docchat::rag::RagService;
use docchat::rag::Retriever;

const HOOKS_MD: &str = "# State\n\nuseState adds a state variable to your component.\n\nCall it at the top level of your component.\n\n# Effects\n\nuseEffect runs an effect after render, and a ref holds a value.";
const JSX_MD: &str = "# JSX\n\nJSX lets you write markup inside JavaScript.";

fn config_for(dir: &std::path::Path, mode: RetrievalMode) -> AppConfig {
    let mut config = AppConfig::default();
    config.store.persist_dir = dir.join("index");
    config.store.chunk_size = 110;
    config.store.child_chunk_size = 70;
    config.retrieval.mode = mode;
    config.retrieval.top_k = 1;
    config.query_generation.max_queries = 3;
    config
}

fn write_docs(dir: &std::path::Path) -> std::path::PathBuf {
    let docs = dir.join("docs");
    std::fs::create_dir_all(docs.join("learn")).unwrap();
    std::fs::write(docs.join("hooks.md"), HOOKS_MD).unwrap();
    std::fs::write(docs.join("learn/jsx.mdx"), JSX_MD).unwrap();
    docs
}

#[tokio::test]
async fn test_ingest_then_answer_prompt_in_vector_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), RetrievalMode::Vector);
    let docs = write_docs(dir.path());

    let ingestor = Ingestor::from_config(&config, Arc::new(TopicEmbedder)).unwrap();
    let report = ingestor.ingest_paths(&[docs]).await.unwrap();
    assert_eq!(report.documents, 2);
    assert!(report.chunks >= 2);

    let model = Arc::new(FakeModel::new("state variable\njsx markup\nstate again\neffect", &[]));
    let rag = RagService::from_config(&config, model, Arc::new(TopicEmbedder)).unwrap();

    let prompt = rag.create_prompt("How do I add state?").await.unwrap();
    assert!(prompt.contains("useState adds a state variable"));
    assert!(prompt.contains("JSX lets you write markup"));
    // the fourth line is past max_queries
    assert!(!prompt.contains("useEffect runs an effect"));
}

#[tokio::test]
async fn test_generate_queries_bounded_by_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), RetrievalMode::Vector);
    let model = Arc::new(FakeModel::new("a\nb\nc\nd\ne\nf", &[]));
    let rag = RagService::from_config(&config, model, Arc::new(TopicEmbedder)).unwrap();

    let queries = rag.multi_query().generate_queries("anything").await.unwrap();
    assert_eq!(queries, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_parent_mode_returns_whole_parent() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), RetrievalMode::Parent);
    let docs = write_docs(dir.path());

    let ingestor = Ingestor::from_config(&config, Arc::new(TopicEmbedder)).unwrap();
    let report = ingestor.ingest_paths(&[docs]).await.unwrap();
    assert!(report.parents >= 2);
    assert!(report.chunks > report.parents);

    let model = Arc::new(FakeModel::new("effect with a ref", &[]));
    let rag = RagService::from_config(&config, model, Arc::new(TopicEmbedder)).unwrap();
    let found = rag.multi_query().retrieve("effects?").await.unwrap();

    assert_eq!(found.len(), 1);
    // the matching child is the paragraph, its parent also carries the heading
    assert_eq!(
        found[0].page_content,
        "# Effects\n\nuseEffect runs an effect after render, and a ref holds a value."
    );
}

#[tokio::test]
async fn test_index_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), RetrievalMode::Vector);
    let docs = write_docs(dir.path());

    {
        let ingestor = Ingestor::from_config(&config, Arc::new(TopicEmbedder)).unwrap();
        ingestor.ingest_paths(&[docs]).await.unwrap();
    }

    let model = Arc::new(FakeModel::new("jsx", &[]));
    let rag = RagService::from_config(&config, model, Arc::new(TopicEmbedder)).unwrap();
    let context = rag.retrieve_context("jsx?").await.unwrap();
    assert_eq!(context, "# JSX\n\nJSX lets you write markup inside JavaScript.");
}
