//! Embedded persistence: a vector similarity index and a key/document store

pub mod docstore;
pub mod vector;

use std::path::Path;

pub use docstore::DocStore;
pub use vector::ScoredDocument;
pub use vector::VectorStore;

use crate::errors::Result;

/// Write via a temp file and rename so readers never see a partial file
pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
