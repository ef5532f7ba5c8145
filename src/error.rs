//! Error taxonomy for the retrieval core.

use thiserror::Error;

/// Kinds of failure the core can surface. `IndexMissing` is recovered
/// internally by the Query Expander and should never reach a caller;
/// it is kept here only to keep the taxonomy complete.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("storage collaborator unavailable: {0}")]
    StorageUnavailable(String),

    #[error("document {0} has no stored co-occurrence index")]
    IndexMissing(i64),

    #[error("chunk {document_id}/{chunk_number} envelope ({size} chars) exceeds the super chunk limit ({limit} chars)")]
    OversizedChunk {
        document_id: i64,
        chunk_number: u32,
        size: usize,
        limit: usize,
    },

    #[error("query cancelled")]
    Cancelled,
}

pub type CoreResult<T> = Result<T, CoreError>;
