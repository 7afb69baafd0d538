//! Paragraph-aware text splitter.
//!
//! Splitting strategy:
//! 1. Split at blank lines (paragraph boundaries)
//! 2. Merge paragraphs up to the character budget
//! 3. If a paragraph is still too large, merge its single lines instead
//! 4. Last resort: split a line at a character boundary

use crate::models::Document;

/// Metadata key holding a chunk's position within its source document
pub const CHUNK_INDEX_KEY: &str = "chunk";

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
}

impl TextSplitter {
    /// `chunk_size` is a budget in characters; zero is treated as one
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in paragraphs(text) {
            if char_len(&paragraph) > self.chunk_size {
                flush(&mut current, &mut chunks);
                self.split_paragraph(&paragraph, &mut chunks);
            } else {
                self.append(&mut current, &paragraph, "\n\n", &mut chunks);
            }
        }

        flush(&mut current, &mut chunks);
        chunks
    }

    /// Split each document, copying its metadata onto every chunk
    #[must_use]
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.page_content)
                    .into_iter()
                    .enumerate()
                    .map(move |(idx, chunk)| Document {
                        page_content: chunk,
                        metadata: doc.metadata.clone(),
                    }
                    .with_metadata(CHUNK_INDEX_KEY, idx))
            })
            .collect()
    }

    fn split_paragraph(&self, paragraph: &str, chunks: &mut Vec<String>) {
        let mut current = String::new();
        for line in paragraph.lines() {
            if char_len(line) > self.chunk_size {
                flush(&mut current, chunks);
                chunks.extend(hard_split(line, self.chunk_size));
            } else {
                self.append(&mut current, line, "\n", chunks);
            }
        }
        flush(&mut current, chunks);
    }

    /// Add `piece` to `current`, flushing first if it would overflow the budget
    fn append(&self, current: &mut String, piece: &str, separator: &str, chunks: &mut Vec<String>) {
        if !current.is_empty() && char_len(current) + separator.len() + char_len(piece) > self.chunk_size {
            flush(current, chunks);
        }
        if !current.is_empty() {
            current.push_str(separator);
        }
        current.push_str(piece);
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
}

/// Blank-line separated blocks, inner lines kept as written
fn paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !lines.is_empty() {
                paragraphs.push(lines.join("\n"));
                lines.clear();
            }
        } else {
            lines.push(line.trim_end());
        }
    }
    if !lines.is_empty() {
        paragraphs.push(lines.join("\n"));
    }

    paragraphs
}

fn hard_split(line: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}
