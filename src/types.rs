//! Core data model: documents, chunks, and the co-occurrence index
//! built over them. These types are owned by the storage collaborator
//! and treated as immutable by the retrieval core.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document known to the storage collaborator. Immutable after ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub name: String,
}

/// A contiguous, pre-chunked slice of a document's text, produced
/// upstream of the core — the core never re-chunks. Chunks are
/// totally ordered within a document by `chunk_number`, with no gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: i64,
    pub document_id: i64,
    pub chunk_number: u32,
    pub content: String,
    pub char_count: usize,
}

impl Chunk {
    pub fn new(id: i64, document_id: i64, chunk_number: u32, content: impl Into<String>) -> Self {
        let content = content.into();
        let char_count = content.chars().count();
        Self {
            id,
            document_id,
            chunk_number,
            content,
            char_count,
        }
    }

    /// Ordering key used throughout the core for chronological and
    /// tie-breaking comparisons: (documentId, chunkNumber).
    pub fn order_key(&self) -> (i64, u32) {
        (self.document_id, self.chunk_number)
    }
}

/// Sparse per-document co-occurrence matrix plus term frequencies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoOccurrenceIndex {
    /// matrix[term][neighbor] = windowed co-occurrence count.
    pub matrix: HashMap<String, HashMap<String, u32>>,
    pub term_frequencies: HashMap<String, u32>,
    pub total_terms: u32,
}

impl CoOccurrenceIndex {
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    pub fn vector_for(&self, term: &str) -> Option<&HashMap<String, u32>> {
        self.matrix.get(term)
    }
}
