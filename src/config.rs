//! Tunable constants and account-tier presets, overridable via
//! `CHUNKLOOM_*` environment variables.

use serde::{Deserialize, Serialize};

/// Downstream chat-model paste-size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Standard,
    Large,
}

impl Tier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(Tier::Standard),
            "large" => Some(Tier::Large),
            _ => None,
        }
    }

    pub fn super_chunk_size(self) -> usize {
        match self {
            Tier::Standard => 30_000,
            Tier::Large => 100_000,
        }
    }

    pub fn package_size(self) -> usize {
        match self {
            Tier::Standard => 75_000,
            Tier::Large => 150_000,
        }
    }
}

/// All tunable constants for the retrieval pipeline, with their defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Config {
    // Indexer
    pub window_size: usize,
    pub min_frequency: u32,
    pub max_terms: usize,

    // Similarity engine
    pub min_similarity: f64,
    pub max_expansions: usize,

    // Chunk scorer
    pub original_term_weight: f64,
    pub semantic_weight: f64,
    pub proximity_weight: f64,
    pub high_similarity_threshold: f64,
    pub minimum_score_threshold: f64,
    pub proximity_distance: usize,

    // Packer — a deployment choice: when a single chunk's own envelope
    // exceeds the super chunk limit, fail instead of emitting it
    // oversize with a warning.
    pub fail_on_oversized_chunk: bool,

    // Ingest-time chunk size, not part of the retrieval core itself.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: 7,
            min_frequency: 2,
            max_terms: 10_000,
            min_similarity: 0.3,
            max_expansions: 5,
            original_term_weight: 100.0,
            semantic_weight: 30.0,
            proximity_weight: 50.0,
            high_similarity_threshold: 0.7,
            minimum_score_threshold: 30.0,
            proximity_distance: 200,
            fail_on_oversized_chunk: false,
            chunk_size: 2000,
        }
    }
}

impl Config {
    pub fn for_tier(_tier: Tier) -> Self {
        // Tiers only affect packer sizing (super_chunk_size/package_size),
        // which is supplied separately to the packer; scoring/index
        // tunables are tier-independent.
        Self::default()
    }

    /// Overlay `CHUNKLOOM_*` environment variables onto defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        macro_rules! env_num {
            ($field:expr, $name:literal) => {
                if let Ok(v) = std::env::var($name) {
                    if let Ok(parsed) = v.parse() {
                        $field = parsed;
                    }
                }
            };
        }
        env_num!(cfg.window_size, "CHUNKLOOM_WINDOW_SIZE");
        env_num!(cfg.min_frequency, "CHUNKLOOM_MIN_FREQUENCY");
        env_num!(cfg.max_terms, "CHUNKLOOM_MAX_TERMS");
        env_num!(cfg.min_similarity, "CHUNKLOOM_MIN_SIMILARITY");
        env_num!(cfg.max_expansions, "CHUNKLOOM_MAX_EXPANSIONS");
        env_num!(cfg.original_term_weight, "CHUNKLOOM_ORIGINAL_TERM_WEIGHT");
        env_num!(cfg.semantic_weight, "CHUNKLOOM_SEMANTIC_WEIGHT");
        env_num!(cfg.proximity_weight, "CHUNKLOOM_PROXIMITY_WEIGHT");
        env_num!(
            cfg.high_similarity_threshold,
            "CHUNKLOOM_HIGH_SIMILARITY_THRESHOLD"
        );
        env_num!(
            cfg.minimum_score_threshold,
            "CHUNKLOOM_MINIMUM_SCORE_THRESHOLD"
        );
        env_num!(cfg.proximity_distance, "CHUNKLOOM_PROXIMITY_DISTANCE");
        env_num!(cfg.chunk_size, "CHUNKLOOM_CHUNK_SIZE");
        cfg
    }
}
