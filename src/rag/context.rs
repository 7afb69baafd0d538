//! Context assembly from retrieved documents

use crate::models::Document;

/// Separator between documents in the context block
pub const CONTEXT_SEPARATOR: &str = "\n";

/// Joins retrieved documents into the context block of the answer prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    /// Document contents in retrieval order, metadata dropped
    #[must_use]
    pub fn assemble(&self, documents: &[Document]) -> String {
        documents
            .iter()
            .map(|doc| doc.page_content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }
}
