//! Storage collaborator. Document parsing, persistence, and the UI
//! live outside the retrieval core; this module defines the narrow
//! async contract the core depends on and ships one in-process
//! implementation used by the CLI and the test suite. A real
//! deployment could swap in a different `Storage` impl (e.g. one
//! backed by a database) without touching the retrieval pipeline.

use crate::types::{Chunk, CoOccurrenceIndex, Document};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read/write contract between the core and wherever documents,
/// chunks, and indices actually live. The query path only calls the
/// `get_*` methods; `add_vectors` belongs to ingestion, not querying.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_chunks_by_document(&self, doc_id: i64) -> Vec<Chunk>;
    async fn get_chunks_by_collection(&self, collection_id: i64) -> Vec<Chunk>;
    async fn get_document(&self, doc_id: i64) -> Option<Document>;
    async fn get_vectors(&self, doc_id: i64) -> Option<CoOccurrenceIndex>;
    async fn add_vectors(&self, doc_id: i64, index: CoOccurrenceIndex);
}

#[derive(Default)]
struct StoreState {
    documents: HashMap<i64, Document>,
    chunks: HashMap<i64, Vec<Chunk>>, // document_id -> chronological chunks
    indices: HashMap<i64, CoOccurrenceIndex>,
    collections: HashMap<i64, Vec<i64>>, // collection_id -> document_ids
}

/// In-process `Storage` implementation guarded by a single `RwLock`.
/// Good enough for a single CLI invocation or a test; not a durable
/// persistence layer on its own (the CLI snapshots it to disk between
/// invocations).
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_document(&self, document: Document) {
        self.state.write().await.documents.insert(document.id, document);
    }

    /// Insert chunks, keeping each document's chunk list chronologically
    /// ordered by `chunk_number`.
    pub async fn put_chunks(&self, chunks: Vec<Chunk>) {
        let mut state = self.state.write().await;
        for chunk in chunks {
            let entry = state.chunks.entry(chunk.document_id).or_default();
            entry.push(chunk);
            entry.sort_by_key(|c| c.chunk_number);
        }
    }

    pub async fn put_collection(&self, collection_id: i64, document_ids: Vec<i64>) {
        self.state.write().await.collections.insert(collection_id, document_ids);
    }

    pub async fn delete_document(&self, doc_id: i64) -> usize {
        let mut state = self.state.write().await;
        state.documents.remove(&doc_id);
        state.indices.remove(&doc_id);
        state.chunks.remove(&doc_id).map(|c| c.len()).unwrap_or(0)
    }

    pub async fn list_documents(&self) -> Vec<Document> {
        let state = self.state.read().await;
        let mut docs: Vec<Document> = state.documents.values().cloned().collect();
        docs.sort_by_key(|d| d.id);
        docs
    }

    pub async fn chunk_count(&self, doc_id: i64) -> usize {
        self.state.read().await.chunks.get(&doc_id).map(|c| c.len()).unwrap_or(0)
    }

    pub async fn stats(&self) -> (usize, usize, usize) {
        let state = self.state.read().await;
        let documents = state.documents.len();
        let chunks = state.chunks.values().map(|v| v.len()).sum();
        let vocabulary: usize = state
            .indices
            .values()
            .map(|idx| idx.term_frequencies.len())
            .sum();
        (documents, chunks, vocabulary)
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn get_chunks_by_document(&self, doc_id: i64) -> Vec<Chunk> {
        self.state.read().await.chunks.get(&doc_id).cloned().unwrap_or_default()
    }

    async fn get_chunks_by_collection(&self, collection_id: i64) -> Vec<Chunk> {
        let state = self.state.read().await;
        let Some(doc_ids) = state.collections.get(&collection_id) else {
            return Vec::new();
        };
        doc_ids
            .iter()
            .flat_map(|id| state.chunks.get(id).cloned().unwrap_or_default())
            .collect()
    }

    async fn get_document(&self, doc_id: i64) -> Option<Document> {
        self.state.read().await.documents.get(&doc_id).cloned()
    }

    async fn get_vectors(&self, doc_id: i64) -> Option<CoOccurrenceIndex> {
        self.state.read().await.indices.get(&doc_id).cloned()
    }

    async fn add_vectors(&self, doc_id: i64, index: CoOccurrenceIndex) {
        self.state.write().await.indices.insert(doc_id, index);
    }
}
