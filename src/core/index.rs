//! Co-occurrence Indexer: builds a per-document sparse co-occurrence
//! matrix and term frequencies from raw text.

use crate::config::Config;
use crate::core::tokenizer;
use crate::types::CoOccurrenceIndex;
use std::collections::HashMap;

/// Build a `CoOccurrenceIndex` over a document's full text.
///
/// Unigrams, bigrams, and trigrams are concatenated into one
/// positional sequence — unigrams first, then bigrams, then trigrams —
/// and the co-occurrence window operates on indices into that
/// sequence, not on character offsets. N-grams are therefore windowed
/// as terms in their own right alongside their constituent unigrams,
/// which double-counts them near window edges; this is intentional and
/// kept stable rather than "fixed" into separate per-order windows.
pub fn build_index(text: &str, config: &Config) -> CoOccurrenceIndex {
    if text.trim().is_empty() {
        return CoOccurrenceIndex::default();
    }

    let unigrams = tokenizer::tokenize(text);
    let bigrams = tokenizer::bigrams(&unigrams);
    let trigrams = tokenizer::trigrams(&unigrams);

    let seq: Vec<String> = unigrams
        .into_iter()
        .chain(bigrams)
        .chain(trigrams)
        .map(|t| t.term)
        .collect();

    if seq.is_empty() {
        return CoOccurrenceIndex::default();
    }

    let mut freq: HashMap<String, u32> = HashMap::new();
    for term in &seq {
        *freq.entry(term.clone()).or_insert(0) += 1;
    }

    // Drop terms below the minimum frequency.
    freq.retain(|_, count| *count >= config.min_frequency);

    // Cap vocabulary by descending frequency, ties broken lexicographically
    // for determinism, when it exceeds max_terms.
    if freq.len() > config.max_terms {
        let mut ranked: Vec<(String, u32)> = freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(config.max_terms);
        freq = ranked.into_iter().collect();
    }

    let filtered_seq: Vec<&String> = seq.iter().filter(|t| freq.contains_key(*t)).collect();

    let mut matrix: HashMap<String, HashMap<String, u32>> = HashMap::new();
    let window = config.window_size;
    let len = filtered_seq.len();

    for i in 0..len {
        let lo = i.saturating_sub(window);
        let hi = (i + window).min(len.saturating_sub(1));
        for j in lo..=hi {
            if j == i || filtered_seq[j] == filtered_seq[i] {
                continue;
            }
            let center = filtered_seq[i].clone();
            let neighbor = filtered_seq[j].clone();
            *matrix.entry(center).or_default().entry(neighbor).or_insert(0) += 1;
        }
    }

    let total_terms = freq.len() as u32;

    CoOccurrenceIndex {
        matrix,
        term_frequencies: freq,
        total_terms,
    }
}
