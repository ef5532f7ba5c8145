//! Similarity Engine: cosine similarity over sparse co-occurrence
//! vectors, and top-K nearest-term lookup.

use crate::config::Config;
use crate::types::CoOccurrenceIndex;
use std::collections::HashMap;

/// Cosine similarity between two sparse term-count vectors. Returns 0
/// if either magnitude is zero.
pub fn similarity(vec1: &HashMap<String, u32>, vec2: &HashMap<String, u32>) -> f64 {
    let (smaller, larger) = if vec1.len() <= vec2.len() {
        (vec1, vec2)
    } else {
        (vec2, vec1)
    };

    let dot: f64 = smaller
        .iter()
        .filter_map(|(term, count)| larger.get(term).map(|other| *count as f64 * *other as f64))
        .sum();

    let norm = |v: &HashMap<String, u32>| -> f64 {
        v.values().map(|c| (*c as f64) * (*c as f64)).sum::<f64>().sqrt()
    };

    let denom = norm(vec1) * norm(vec2);
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// A term similar to a query term, with its cosine similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarTerm {
    pub term: String,
    pub similarity: f64,
}

/// Top-K terms similar to `term` within `index`, excluding `term`
/// itself and anything below `config.min_similarity`. Ties broken
/// lexicographically for determinism.
pub fn find_similar_terms(
    term: &str,
    index: &CoOccurrenceIndex,
    k: usize,
    config: &Config,
) -> Vec<SimilarTerm> {
    let Some(vec1) = index.vector_for(term) else {
        return Vec::new();
    };

    let mut candidates: Vec<SimilarTerm> = index
        .matrix
        .iter()
        .filter(|(candidate, _)| candidate.as_str() != term)
        .map(|(candidate, vec2)| SimilarTerm {
            term: candidate.clone(),
            similarity: similarity(vec1, vec2),
        })
        .filter(|c| c.similarity >= config.min_similarity)
        .collect();

    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap()
            .then_with(|| a.term.cmp(&b.term))
    });
    candidates.truncate(k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec_of(&[("a", 3), ("b", 1)]);
        assert!((similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_vectors_have_similarity_zero() {
        let v1 = vec_of(&[("a", 3)]);
        let v2 = vec_of(&[("b", 5)]);
        assert_eq!(similarity(&v1, &v2), 0.0);
    }

    #[test]
    fn zero_magnitude_returns_zero() {
        let v1: HashMap<String, u32> = HashMap::new();
        let v2 = vec_of(&[("a", 1)]);
        assert_eq!(similarity(&v1, &v2), 0.0);
    }

    #[test]
    fn similarity_is_bounded_in_unit_interval() {
        let v1 = vec_of(&[("a", 3), ("b", 1), ("c", 7)]);
        let v2 = vec_of(&[("a", 1), ("b", 9), ("d", 2)]);
        let s = similarity(&v1, &v2);
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn find_similar_terms_excludes_self_and_orders_deterministically() {
        let mut index = CoOccurrenceIndex::default();
        index.matrix.insert("fuel".into(), vec_of(&[("line", 5), ("pump", 5)]));
        index.matrix.insert("pump".into(), vec_of(&[("line", 5), ("fuel", 5)]));
        index.matrix.insert("line".into(), vec_of(&[("fuel", 5), ("pump", 5)]));
        let config = Config::default();
        let results = find_similar_terms("fuel", &index, 5, &config);
        assert!(results.iter().all(|r| r.term != "fuel"));
        assert_eq!(results[0].term, "line");
        assert_eq!(results[1].term, "pump");
    }
}
