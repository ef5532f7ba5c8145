//! Orchestrator: the entry point, `execute_query`. Wires retrieval →
//! expansion → scoring → spatial filtering → packing → formatting for
//! every topic in a query.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::format;
use crate::core::packer::{self, SuperChunk, TopicResult};
use crate::core::scorer::{self, ScoredChunk};
use crate::core::spatial::{self, SpatialMode};
use crate::error::{CoreError, CoreResult};
use crate::store::Storage;
use crate::types::Chunk;

use super::expand::expand_query_multi_doc;

/// A cooperative cancel signal the Orchestrator checks between topics
/// and between the score/filter/pack phases. Cancelling never returns
/// partial output.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fixed phase boundaries a caller may observe via an optional
/// progress callback invoked as each phase starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Retrieve,
    Expand,
    Score,
    Pack,
    Format,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicQueryDto {
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default = "default_spatial_category")]
    pub spatial_category: String,
}

fn default_spatial_category() -> String {
    "auto".to_string()
}

fn default_version() -> String {
    "2.3".to_string()
}

fn default_max_super_chunks_per_topic() -> usize {
    3
}

/// Query structure, deserialized directly from the external JSON
/// shape; `normalize_topics` fills in legacy-version defaults before use.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStructureDto {
    #[serde(default = "default_version")]
    pub version: String,
    pub account_tier: String,
    pub max_chars_per_super_chunk: usize,
    pub source_type: String,
    #[serde(default)]
    pub document_ids: Vec<i64>,
    #[serde(default)]
    pub collection_id: Option<i64>,
    #[serde(default)]
    pub topics: Vec<TopicQueryDto>,
    #[serde(default)]
    pub limit_super_chunks: bool,
    #[serde(default = "default_max_super_chunks_per_topic")]
    pub max_super_chunks_per_topic: usize,
}

struct NormalizedTopic {
    topic_id: String,
    question: String,
    spatial: SpatialMode,
}

/// Normalize legacy query versions by populating defaults for
/// `topicId`/`topicQuestion`/spatial category.
fn normalize_topics(topics: &[TopicQueryDto]) -> Vec<NormalizedTopic> {
    topics
        .iter()
        .enumerate()
        .map(|(i, t)| NormalizedTopic {
            topic_id: t.topic_id.clone().unwrap_or_else(|| format!("topic-{}", i + 1)),
            question: t.question.clone(),
            spatial: SpatialMode::parse(&t.spatial_category).unwrap_or(SpatialMode::Auto),
        })
        .collect()
}

fn validate(query: &QueryStructureDto) -> CoreResult<()> {
    if query.account_tier != "standard" && query.account_tier != "large" {
        return Err(CoreError::InputInvalid(format!(
            "unknown account tier: {}",
            query.account_tier
        )));
    }
    if query.topics.is_empty() {
        return Err(CoreError::InputInvalid("topic list is empty".into()));
    }
    if query.topics.iter().any(|t| t.question.trim().is_empty()) {
        return Err(CoreError::InputInvalid("a topic has an empty question".into()));
    }
    match query.source_type.as_str() {
        "documents" => {
            if query.document_ids.is_empty() {
                return Err(CoreError::InputInvalid("zero documents selected".into()));
            }
        }
        "collection" => {
            if query.collection_id.is_none() {
                return Err(CoreError::InputInvalid("no collection selected".into()));
            }
        }
        other => {
            return Err(CoreError::InputInvalid(format!("unknown sourceType: {other}")));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TopicResultOutput {
    pub topic_id: String,
    pub topic_question: String,
    pub chunks: Vec<ScoredChunk>,
}

#[derive(Debug, Clone)]
pub struct RenderedSuperChunk {
    pub content: String,
    pub char_count: usize,
}

#[derive(Debug, Clone)]
pub struct ExecuteQueryResult {
    pub topic_results: Vec<TopicResultOutput>,
    pub super_chunks: Vec<RenderedSuperChunk>,
    pub timestamp: DateTime<Utc>,
}

fn check_cancel(cancel: Option<&CancelToken>) -> CoreResult<()> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        Err(CoreError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run the full pipeline for one query.
pub async fn execute_query(
    query: &QueryStructureDto,
    storage: &dyn Storage,
    config: &Config,
    now: DateTime<Utc>,
    progress: Option<&(dyn Fn(Phase) + Sync)>,
    cancel: Option<&CancelToken>,
) -> CoreResult<ExecuteQueryResult> {
    validate(query)?;
    let topics = normalize_topics(&query.topics);

    // --- Retrieve ---
    if let Some(cb) = progress {
        cb(Phase::Retrieve);
    }
    check_cancel(cancel)?;

    let chunks: Vec<Chunk> = match query.source_type.as_str() {
        "documents" => {
            let mut all = Vec::new();
            for &doc_id in &query.document_ids {
                all.extend(storage.get_chunks_by_document(doc_id).await);
            }
            all
        }
        "collection" => {
            let collection_id = query.collection_id.expect("validated above");
            storage.get_chunks_by_collection(collection_id).await
        }
        _ => unreachable!("validated above"),
    };

    let doc_ids: Vec<i64> = {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for c in &chunks {
            if seen.insert(c.document_id) {
                ids.push(c.document_id);
            }
        }
        ids
    };

    let mut doc_names: HashMap<i64, String> = HashMap::new();
    for &doc_id in &doc_ids {
        if let Some(doc) = storage.get_document(doc_id).await {
            doc_names.insert(doc_id, doc.name);
        }
    }

    // --- Expand + Score (per topic; topic isolation: each depends only
    // on its own question and the shared document set) ---
    let mut topic_results = Vec::with_capacity(topics.len());
    for topic in &topics {
        check_cancel(cancel)?;

        if let Some(cb) = progress {
            cb(Phase::Expand);
        }
        let concept = expand_query_multi_doc(&topic.question, &doc_ids, storage, config).await;

        if let Some(cb) = progress {
            cb(Phase::Score);
        }
        check_cancel(cancel)?;
        let ranked = scorer::score_and_rank(&chunks, &concept, config);
        let filtered = spatial::apply_filter(ranked, topic.spatial);

        topic_results.push(TopicResultOutput {
            topic_id: topic.topic_id.clone(),
            topic_question: topic.question.clone(),
            chunks: filtered,
        });
    }

    // --- Pack ---
    if let Some(cb) = progress {
        cb(Phase::Pack);
    }
    check_cancel(cancel)?;

    let package_header = format::render_package_header(
        &topic_results.iter().map(|t| t.topic_question.clone()).collect::<Vec<_>>(),
    );

    let packer_input: Vec<TopicResult> = topic_results
        .iter()
        .map(|t| TopicResult {
            topic_id: t.topic_id.clone(),
            topic_question: t.topic_question.clone(),
            chunks: t.chunks.clone(),
        })
        .collect();

    let mut super_chunks = packer::pack(
        &packer_input,
        &doc_names,
        query.max_chars_per_super_chunk,
        &package_header,
    );

    if query.limit_super_chunks {
        super_chunks = packer::apply_limit(super_chunks, query.max_super_chunks_per_topic);
    }

    // --- Format ---
    if let Some(cb) = progress {
        cb(Phase::Format);
    }
    check_cancel(cancel)?;

    let rendered = render_all(&super_chunks, &package_header, query.max_chars_per_super_chunk, config)?;

    Ok(ExecuteQueryResult {
        topic_results,
        super_chunks: rendered,
        timestamp: now,
    })
}

/// Render every packed super chunk. A super chunk holding exactly one
/// oversize chunk is the only allowed violation of the size bound;
/// depending on `config.fail_on_oversized_chunk` it is either logged
/// and emitted, or rejected.
fn render_all(
    super_chunks: &[SuperChunk],
    package_header: &str,
    limit: usize,
    config: &Config,
) -> CoreResult<Vec<RenderedSuperChunk>> {
    let total = super_chunks.len();
    let mut out = Vec::with_capacity(total);
    for (i, sc) in super_chunks.iter().enumerate() {
        let index = i + 1;
        let is_last = index == total;
        let header = if index == 1 { Some(package_header) } else { None };
        let content = format::render_super_chunk(sc, index, total, is_last, header);
        let char_count = content.chars().count();

        if char_count > limit {
            let only_chunk = sc.topics.iter().flat_map(|t| &t.chunks).next();
            if config.fail_on_oversized_chunk {
                if let Some(c) = only_chunk {
                    return Err(CoreError::OversizedChunk {
                        document_id: c.document_id,
                        chunk_number: c.chunk_number,
                        size: char_count,
                        limit,
                    });
                }
            }
            tracing::warn!(chars = char_count, limit, "emitting oversize super chunk");
        }

        out.push(RenderedSuperChunk { content, char_count });
    }
    Ok(out)
}
