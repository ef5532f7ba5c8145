//! Query Expander: builds a single per-topic `ExpandedConcept` from a
//! natural-language question and the active document set's
//! co-occurrence indices.

use crate::config::Config;
use crate::store::Storage;
use std::collections::HashMap;

use super::tokenizer;

/// Per-term metadata carried in an `ExpandedConcept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermMetadata {
    pub similarity: f64,
    pub is_original: bool,
}

/// A topic's expanded term set, merged across all queried documents.
#[derive(Debug, Clone, Default)]
pub struct ExpandedConcept {
    pub original_terms: Vec<String>,
    pub terms: Vec<String>,
    pub term_metadata: HashMap<String, TermMetadata>,
    pub original_question: String,
}

/// Expand a topic's question text into a single concept, merging
/// neighbors found across every document in `doc_ids`. Documents with
/// no stored index degrade gracefully: they contribute only the
/// literal query terms (`CoreError::IndexMissing` is recovered here,
/// never surfaced to the caller).
pub async fn expand_query_multi_doc(
    question: &str,
    doc_ids: &[i64],
    storage: &dyn Storage,
    config: &Config,
) -> ExpandedConcept {
    let original_terms = tokenizer::tokenize_unique_terms(question);
    let original_set: std::collections::HashSet<&str> =
        original_terms.iter().map(|s| s.as_str()).collect();

    // term -> best similarity observed across all documents.
    let mut best_similarity: HashMap<String, f64> = HashMap::new();
    for t in &original_terms {
        best_similarity.insert(t.clone(), 1.0);
    }

    for &doc_id in doc_ids {
        let Some(index) = storage.get_vectors(doc_id).await else {
            // IndexMissing: recovered locally, no original-term contribution lost.
            continue;
        };

        for term in &original_terms {
            if index.vector_for(term).is_none() {
                continue;
            }
            let neighbors =
                super::similarity::find_similar_terms(term, &index, config.max_expansions, config);
            for n in neighbors {
                let entry = best_similarity.entry(n.term).or_insert(0.0);
                if n.similarity > *entry {
                    *entry = n.similarity;
                }
            }
        }
    }

    let mut terms: Vec<String> = best_similarity.keys().cloned().collect();
    terms.sort();

    let term_metadata: HashMap<String, TermMetadata> = best_similarity
        .into_iter()
        .map(|(term, similarity)| {
            let is_original = original_set.contains(term.as_str());
            let similarity = if is_original { 1.0 } else { similarity };
            (term.clone(), TermMetadata { similarity, is_original })
        })
        .collect();

    ExpandedConcept {
        original_terms,
        terms,
        term_metadata,
        original_question: question.to_string(),
    }
}
