//! Local key/document store backing parent-document retrieval

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::info;

use crate::errors::DocChatError;
use crate::errors::Result;
use crate::models::Document;
use crate::store::write_atomic;

const DOCSTORE_FILE: &str = "docstore.json";

/// Persistent `key -> Document` map
pub struct DocStore {
    docs: RwLock<HashMap<String, Document>>,
    persist_path: PathBuf,
}

impl DocStore {
    pub fn open_or_create(persist_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(persist_dir)?;
        let persist_path = persist_dir.join(DOCSTORE_FILE);

        let docs: HashMap<String, Document> = if persist_path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&persist_path)?)?
        } else {
            HashMap::new()
        };

        info!("Docstore opened at {} ({} documents)", persist_path.display(), docs.len());

        Ok(Self {
            docs: RwLock::new(docs),
            persist_path,
        })
    }

    /// Insert or overwrite documents by key; on a failed write the map is left unchanged
    pub fn mset(&self, items: Vec<(String, Document)>) -> Result<()> {
        let mut docs = self.docs.write();
        let previous: Vec<(String, Option<Document>)> = items
            .into_iter()
            .map(|(key, doc)| {
                let old = docs.insert(key.clone(), doc);
                (key, old)
            })
            .collect();

        let persisted = serde_json::to_string(&*docs)
            .map_err(DocChatError::from)
            .and_then(|data| write_atomic(&self.persist_path, &data));
        if persisted.is_err() {
            for (key, old) in previous.into_iter().rev() {
                match old {
                    Some(doc) => docs.insert(key, doc),
                    None => docs.remove(&key),
                };
            }
        }
        persisted
    }

    /// Look up keys, `None` for missing ones, in the order requested
    pub fn mget(&self, keys: &[String]) -> Vec<Option<Document>> {
        let docs = self.docs.read();
        keys.iter().map(|k| docs.get(k).cloned()).collect()
    }

    pub fn clear(&self) -> Result<()> {
        self.docs.write().clear();
        write_atomic(&self.persist_path, "{}")
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}
