//! Tokenizer: text → ordered token stream, plus the bigrams/trigrams
//! derived from it.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// A single surviving token or n-gram and its offset in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOccurrence {
    pub term: String,
    pub position: usize,
}

/// The closed, case-folded stopword list.
const STOPWORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
    "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
    "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when", "make",
    "can", "like", "time", "no", "just", "him", "know", "take", "people", "into", "year", "your",
    "good", "some", "could", "them", "see", "other", "than", "then", "now", "look", "only",
    "come", "its", "over", "think", "also", "back", "after", "use", "two", "how", "our", "work",
    "first", "well", "way", "even", "new", "want", "because", "any", "these", "give", "day",
    "most", "us", "is", "was", "are", "been", "has", "had", "were", "said", "did", "having",
    "may", "should", "does", "am",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z0-9-]*").unwrap())
}

pub fn is_stopword(term: &str) -> bool {
    stopword_set().contains(term)
}

/// Tokenize raw text into the ordered, stopword-filtered unigram stream.
pub fn tokenize(text: &str) -> Vec<TokenOccurrence> {
    token_pattern()
        .find_iter(text)
        .filter_map(|m| {
            let term = m.as_str().to_lowercase();
            if term.len() < 2 || is_stopword(&term) {
                return None;
            }
            Some(TokenOccurrence {
                term,
                position: m.start(),
            })
        })
        .collect()
}

/// Build n-grams of `n` consecutive surviving unigrams. N-grams never
/// re-apply the stopword filter — they are composed from tokens that
/// already survived it.
fn ngrams(unigrams: &[TokenOccurrence], n: usize) -> Vec<TokenOccurrence> {
    if unigrams.len() < n {
        return Vec::new();
    }
    unigrams
        .windows(n)
        .map(|w| TokenOccurrence {
            term: w.iter().map(|t| t.term.as_str()).collect::<Vec<_>>().join(" "),
            position: w[0].position,
        })
        .collect()
}

pub fn bigrams(unigrams: &[TokenOccurrence]) -> Vec<TokenOccurrence> {
    ngrams(unigrams, 2)
}

pub fn trigrams(unigrams: &[TokenOccurrence]) -> Vec<TokenOccurrence> {
    ngrams(unigrams, 3)
}

/// Tokenize and deduplicate by term, keeping first occurrence — used by
/// the Query Expander, which only needs distinct query terms.
pub fn tokenize_unique_terms(text: &str) -> Vec<String> {
    let unigrams = tokenize(text);
    let bi = bigrams(&unigrams);
    let tri = trigrams(&unigrams);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for t in unigrams.into_iter().chain(bi).chain(tri) {
        if seen.insert(t.term.clone()) {
            out.push(t.term);
        }
    }
    out
}
