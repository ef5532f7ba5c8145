//! Chunk Scorer: hybrid score combining original-term,
//! semantic-expansion, and proximity signals.

use crate::config::Config;
use crate::core::expand::ExpandedConcept;
use crate::types::Chunk;

/// The score components behind a chunk's `total_score`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub original_term_score: f64,
    pub semantic_score: f64,
    pub proximity_score: f64,
    pub matched_terms: Vec<String>,
    pub matched_original_terms: Vec<String>,
    pub match_count: usize,
}

impl ScoreBreakdown {
    pub fn total_score(&self) -> f64 {
        self.original_term_score + self.semantic_score + self.proximity_score
    }
}

/// A chunk augmented with its relevance score and breakdown.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub breakdown: ScoreBreakdown,
}

impl ScoredChunk {
    pub fn relevance_score(&self) -> f64 {
        self.breakdown.total_score()
    }
}

/// Score a single chunk against an expanded topic concept.
pub fn score_chunk(chunk: &Chunk, concept: &ExpandedConcept, config: &Config) -> ScoreBreakdown {
    let content_lower = chunk.content.to_lowercase();
    let mut breakdown = ScoreBreakdown::default();
    let mut occurrence_offsets: Vec<usize> = Vec::new();

    for term in &concept.terms {
        if !content_lower.contains(term.as_str()) {
            continue;
        }
        let Some(meta) = concept.term_metadata.get(term) else {
            continue;
        };

        if meta.is_original {
            breakdown.original_term_score += config.original_term_weight;
            breakdown.matched_original_terms.push(term.clone());
        } else if meta.similarity >= config.high_similarity_threshold {
            breakdown.semantic_score += config.semantic_weight * meta.similarity;
        } else {
            breakdown.semantic_score += config.semantic_weight * meta.similarity * 0.5;
        }

        breakdown.matched_terms.push(term.clone());
        occurrence_offsets.extend(content_lower.match_indices(term.as_str()).map(|(i, _)| i));
    }

    breakdown.match_count = breakdown.matched_terms.len();

    if breakdown.matched_terms.len() >= 2 {
        occurrence_offsets.sort_unstable();
        if let Some(min_gap) = occurrence_offsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .min()
        {
            if min_gap <= config.proximity_distance {
                let ratio = min_gap as f64 / config.proximity_distance as f64;
                breakdown.proximity_score += config.proximity_weight * (1.0 - ratio);
            }
        }
    }

    breakdown
}

/// Score every chunk, drop anything below `minimum_score_threshold`,
/// and rank by descending score with (documentId, chunkNumber) as the
/// deterministic tiebreak. Scoring is embarrassingly parallel per
/// chunk; ranking is applied afterward so output order never depends
/// on scheduling.
pub fn score_and_rank(
    chunks: &[Chunk],
    concept: &ExpandedConcept,
    config: &Config,
) -> Vec<ScoredChunk> {
    use rayon::prelude::*;

    let mut scored: Vec<ScoredChunk> = chunks
        .par_iter()
        .map(|chunk| ScoredChunk {
            chunk: chunk.clone(),
            breakdown: score_chunk(chunk, concept, config),
        })
        .filter(|sc| sc.relevance_score() >= config.minimum_score_threshold)
        .collect();

    scored.sort_by(|a, b| {
        b.relevance_score()
            .partial_cmp(&a.relevance_score())
            .unwrap()
            .then_with(|| a.chunk.order_key().cmp(&b.chunk.order_key()))
    });

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expand::TermMetadata;
    use std::collections::HashMap;

    fn concept(terms: &[(&str, f64, bool)], question: &str) -> ExpandedConcept {
        let mut term_metadata = HashMap::new();
        let mut all_terms = Vec::new();
        let mut original_terms = Vec::new();
        for (term, similarity, is_original) in terms {
            term_metadata.insert(
                term.to_string(),
                TermMetadata { similarity: *similarity, is_original: *is_original },
            );
            all_terms.push(term.to_string());
            if *is_original {
                original_terms.push(term.to_string());
            }
        }
        ExpandedConcept {
            original_terms,
            terms: all_terms,
            term_metadata,
            original_question: question.to_string(),
        }
    }

    #[test]
    fn proximity_bonus_triggers_on_close_terms() {
        let chunk = Chunk::new(1, 1, 0, "configure GPS now");
        let c = concept(&[("configure", 1.0, true), ("gps", 1.0, true)], "configure gps");
        let config = Config::default();
        let breakdown = score_chunk(&chunk, &c, &config);
        assert_eq!(breakdown.original_term_score, 200.0);
        assert!(breakdown.proximity_score > 0.0);
        assert!(breakdown.total_score() > 200.0);
    }

    #[test]
    fn below_threshold_chunk_is_dropped_from_ranking() {
        let chunk = Chunk::new(1, 1, 0, "a passage about something unrelated to gizmos");
        let c = concept(&[("gizmos", 0.4, false)], "gizmos");
        let config = Config::default();
        let ranked = score_and_rank(&[chunk], &c, &config);
        assert!(ranked.is_empty());
    }

    #[test]
    fn score_monotonicity_extra_occurrence_does_not_decrease_score() {
        let chunk_once = Chunk::new(1, 1, 0, "fuel system overview");
        let chunk_twice = Chunk::new(1, 1, 0, "fuel system overview, fuel system details");
        let c = concept(&[("fuel", 1.0, true), ("system", 1.0, true)], "fuel system");
        let config = Config::default();
        let once = score_chunk(&chunk_once, &c, &config).total_score();
        let twice = score_chunk(&chunk_twice, &c, &config).total_score();
        assert!(twice >= once);
    }

    #[test]
    fn ranking_breaks_ties_by_document_then_chunk_number() {
        let chunks = vec![
            Chunk::new(2, 2, 1, "fuel system fuel system"),
            Chunk::new(1, 1, 0, "fuel system fuel system"),
        ];
        let c = concept(&[("fuel", 1.0, true), ("system", 1.0, true)], "fuel system");
        let config = Config::default();
        let ranked = score_and_rank(&chunks, &c, &config);
        assert_eq!(ranked[0].chunk.document_id, 1);
        assert_eq!(ranked[1].chunk.document_id, 2);
    }

    #[test]
    fn semantic_terms_below_high_threshold_halve_weight() {
        let chunk = Chunk::new(1, 1, 0, "a passage about gizmos and widgets");
        let c = concept(&[("gizmos", 0.5, false)], "gizmos");
        let breakdown = score_chunk(&chunk, &c, &Config::default());
        assert!((breakdown.semantic_score - 30.0 * 0.5 * 0.5).abs() < 1e-9);
    }
}
