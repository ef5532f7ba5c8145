//! Ingest-time helpers: read a plain-text or Markdown file, split it
//! into ~2000-character sentence-bounded chunks, build its
//! co-occurrence index, and hand both to the storage collaborator.
//! Document parsing beyond plain text/Markdown (PDF, DOCX) is not
//! attempted here — those formats need a real parser upstream of this
//! crate.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use text_splitter::MarkdownSplitter;

use crate::config::Config;
use crate::core::index;
use crate::store::{MemoryStore, Storage};
use crate::types::{Chunk, Document};

/// Derive a stable document id from a canonicalized file path, so
/// re-ingesting the same file updates the same document instead of
/// creating a duplicate.
pub fn document_id_for(path: &Path) -> i64 {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    (hasher.finish() >> 1) as i64
}

fn read_document(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "md" | "txt" | "text" | "rst" => {
            std::fs::read_to_string(path).context("failed to read text file")
        }
        _ => bail!("unsupported file format: .{ext} (supported: .md, .txt, .text, .rst)"),
    }
}

/// Ingest a document: read, split, index, and store. Returns the
/// number of chunks produced.
pub async fn ingest_file(path: &Path, store: &MemoryStore, config: &Config) -> Result<usize> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let raw_text = read_document(path)?;
    let text = raw_text.trim();
    if text.is_empty() {
        bail!("document is empty");
    }

    let splitter = MarkdownSplitter::new(config.chunk_size);
    let pieces: Vec<&str> = splitter.chunks(text).collect();
    if pieces.is_empty() {
        bail!("no chunks produced from document");
    }

    let doc_id = document_id_for(path);
    tracing::info!(doc_id, filename, chunks = pieces.len(), "ingesting document");

    let pb = ProgressBar::new(pieces.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})")
            .unwrap()
            .progress_chars("=>-"),
    );

    let chunks: Vec<Chunk> = pieces
        .iter()
        .enumerate()
        .map(|(i, content)| {
            pb.inc(1);
            Chunk::new(doc_id * 100_000 + i as i64, doc_id, i as u32, *content)
        })
        .collect();
    pb.finish_with_message("done");

    let total = chunks.len();
    store.put_document(Document { id: doc_id, name: filename }).await;
    store.put_chunks(chunks).await;
    store.add_vectors(doc_id, index::build_index(text, config)).await;

    Ok(total)
}
