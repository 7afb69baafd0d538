//! Document loading from text files and JSONL exports

use std::path::Path;

use tracing::debug;
use tracing::warn;
use walkdir::DirEntry;
use walkdir::WalkDir;

use crate::errors::DocChatError;
use crate::errors::Result;
use crate::models::Document;

/// Metadata key holding the file a document was loaded from
pub const SOURCE_KEY: &str = "source";

const TEXT_EXTENSIONS: &[&str] = &["md", "mdx", "txt"];
const JSONL_EXTENSION: &str = "jsonl";

/// Load one file, or every supported file under a directory
pub fn load_path(path: &Path) -> Result<Vec<Document>> {
    if path.is_file() {
        return load_file(path);
    }
    if !path.is_dir() {
        return Err(DocChatError::InvalidRequest(format!(
            "No such file or directory: {}",
            path.display()
        )));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(std::result::Result::ok)
    {
        if entry.file_type().is_file() && is_supported(entry.path()) {
            documents.extend(load_file(entry.path())?);
        }
    }
    Ok(documents)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| ext == JSONL_EXTENSION || TEXT_EXTENSIONS.contains(&ext.as_str()))
}

fn load_file(path: &Path) -> Result<Vec<Document>> {
    let source = path.display().to_string();
    match extension(path).as_deref() {
        Some(JSONL_EXTENSION) => load_jsonl(path, &source),
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => {
            let text = std::fs::read_to_string(path)?;
            if text.trim().is_empty() {
                debug!("Skipping empty file {}", source);
                return Ok(Vec::new());
            }
            Ok(vec![Document::new(text).with_metadata(SOURCE_KEY, source)])
        }
        _ => {
            warn!("Skipping unsupported file {}", source);
            Ok(Vec::new())
        }
    }
}

/// One `{"page_content": ..., "metadata": {...}}` record per line
fn load_jsonl(path: &Path, source: &str) -> Result<Vec<Document>> {
    let text = std::fs::read_to_string(path)?;
    let mut documents = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut doc: Document = serde_json::from_str(line).map_err(|e| {
            DocChatError::InvalidRequest(format!("{}:{}: {}", source, line_no + 1, e))
        })?;
        if !doc.metadata.contains_key(SOURCE_KEY) {
            doc = doc.with_metadata(SOURCE_KEY, source);
        }
        documents.push(doc);
    }

    debug!("Loaded {} records from {}", documents.len(), source);
    Ok(documents)
}
