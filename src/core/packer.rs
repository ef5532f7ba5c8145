//! Topic-Packer: groups ranked chunks by topic and packs them into
//! size-bounded super chunks, chronologically within each topic
//! section, splitting into continuations when a super chunk fills up.

use crate::core::format;
use crate::core::scorer::ScoredChunk;
use std::collections::{HashMap, HashSet};

/// A chunk as it will be rendered inside a `TopicSection`.
#[derive(Debug, Clone)]
pub struct RenderedChunk {
    pub document_id: i64,
    pub document_name: String,
    pub chunk_number: u32,
    pub score: f64,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct TopicSection {
    pub topic_id: String,
    pub topic_question: String,
    pub chunks: Vec<RenderedChunk>,
    pub is_continuation: bool,
}

impl TopicSection {
    fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuperChunk {
    pub topics: Vec<TopicSection>,
    pub total_chars: usize,
    pub is_first: bool,
}

impl SuperChunk {
    fn has_any_chunks(&self) -> bool {
        self.topics.iter().any(|t| !t.chunks.is_empty())
    }
}

/// One topic's ranked, already-scored-and-filtered chunks, as handed
/// to the packer by the Orchestrator.
pub struct TopicResult {
    pub topic_id: String,
    pub topic_question: String,
    pub chunks: Vec<ScoredChunk>,
}

fn topic_section_header_len(topic_question: &str, is_continuation: bool, document_name: &str) -> usize {
    format::render_topic_section_header(topic_question, is_continuation).len()
        + format::render_document_line(document_name).len()
}

fn chunk_envelope_len(chunk_number: u32, score: f64, content: &str) -> usize {
    format::render_chunk_envelope(chunk_number, score, content).len()
}

/// Pack ranked topic results into size-bounded super chunks.
///
/// `package_header` is the fully-rendered one-time package header,
/// sized from the *entire* query's topic questions, not just the
/// topics being packed — the Orchestrator renders it once upfront via
/// `format::render_package_header`.
pub fn pack(
    topic_results: &[TopicResult],
    doc_names: &HashMap<i64, String>,
    max_chars_per_super_chunk: usize,
    package_header: &str,
) -> Vec<SuperChunk> {
    let mut output: Vec<SuperChunk> = Vec::new();
    let mut current = SuperChunk { is_first: true, ..Default::default() };
    let mut chars = 0usize;
    let mut is_first_super_chunk = true;

    let close_current = |current: &mut SuperChunk,
                          chars: &mut usize,
                          output: &mut Vec<SuperChunk>,
                          is_first_super_chunk: &mut bool| {
        if current.has_any_chunks() {
            current.total_chars = *chars;
            output.push(std::mem::take(current));
            *current = SuperChunk { is_first: false, ..Default::default() };
            *chars = 0;
            *is_first_super_chunk = false;
        }
    };

    for topic in topic_results {
        if topic.chunks.is_empty() {
            continue;
        }

        let mut chronological: Vec<&ScoredChunk> = topic.chunks.iter().collect();
        chronological.sort_by_key(|sc| sc.chunk.order_key());

        let mut section = TopicSection {
            topic_id: topic.topic_id.clone(),
            topic_question: topic.topic_question.clone(),
            chunks: Vec::new(),
            is_continuation: false,
        };

        for sc in chronological {
            let doc_name = doc_names
                .get(&sc.chunk.document_id)
                .cloned()
                .unwrap_or_else(|| "(unknown)".to_string());
            let envelope_len = chunk_envelope_len(sc.chunk.chunk_number, sc.relevance_score(), &sc.chunk.content);
            let header_len = if section.is_empty() {
                topic_section_header_len(&topic.topic_question, section.is_continuation, &doc_name)
            } else {
                0
            };
            let starting_fresh_super_chunk = chars == 0 && !current.has_any_chunks();
            let package_len = if starting_fresh_super_chunk && is_first_super_chunk {
                package_header.len()
            } else {
                0
            };
            let super_chunk_overhead = if starting_fresh_super_chunk {
                format::super_chunk_overhead_budget(!is_first_super_chunk)
            } else {
                0
            };
            let need = envelope_len + header_len + package_len + super_chunk_overhead;

            if chars + need > max_chars_per_super_chunk
                && (current.has_any_chunks() || !section.is_empty())
            {
                // Flush whatever we have (current may already hold prior
                // topics' sections; `section` holds this topic's so far).
                // Only a split that interrupts a topic already in progress
                // (section non-empty) opens a continuation section for it;
                // a topic that simply hasn't started yet gets a fresh,
                // non-continuation section in the next super chunk.
                if !section.is_empty() {
                    current.topics.push(std::mem::replace(
                        &mut section,
                        TopicSection {
                            topic_id: topic.topic_id.clone(),
                            topic_question: topic.topic_question.clone(),
                            chunks: Vec::new(),
                            is_continuation: true,
                        },
                    ));
                }
                close_current(&mut current, &mut chars, &mut output, &mut is_first_super_chunk);

                let header_len = topic_section_header_len(
                    &topic.topic_question,
                    section.is_continuation,
                    &doc_name,
                );
                // The super chunk we just opened is never the first one.
                chars += header_len + envelope_len + format::super_chunk_overhead_budget(true);
                section.chunks.push(RenderedChunk {
                    document_id: sc.chunk.document_id,
                    document_name: doc_name,
                    chunk_number: sc.chunk.chunk_number,
                    score: sc.relevance_score(),
                    content: sc.chunk.content.clone(),
                });
            } else {
                chars += need;
                section.chunks.push(RenderedChunk {
                    document_id: sc.chunk.document_id,
                    document_name: doc_name,
                    chunk_number: sc.chunk.chunk_number,
                    score: sc.relevance_score(),
                    content: sc.chunk.content.clone(),
                });
            }
        }

        if !section.is_empty() {
            current.topics.push(section);
        }
    }

    if current.has_any_chunks() {
        current.total_chars = chars;
        output.push(current);
    }

    output
}

/// Enforce `limit_super_chunks`: keep at most `max_per_topic` super
/// chunks whose *primary topic* (the topic of the first TopicSection)
/// equals a given topicId, in emission order.
pub fn apply_limit(super_chunks: Vec<SuperChunk>, max_per_topic: usize) -> Vec<SuperChunk> {
    let mut kept_per_topic: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::new();
    for sc in super_chunks {
        let Some(primary) = sc.topics.first().map(|t| t.topic_id.clone()) else {
            continue;
        };
        let count = kept_per_topic.entry(primary).or_insert(0);
        if *count < max_per_topic {
            *count += 1;
            result.push(sc);
        }
    }
    result
}

/// Count distinct chunks selected across all topics, deduplicated by
/// (documentId, chunkNumber) — used for reporting only; each topic
/// still retains its own copy for packing.
pub fn count_distinct_chunks(topic_results: &[TopicResult]) -> usize {
    let mut seen: HashSet<(i64, u32)> = HashSet::new();
    for topic in topic_results {
        for sc in &topic.chunks {
            seen.insert(sc.chunk.order_key());
        }
    }
    seen.len()
}
