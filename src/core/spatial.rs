//! Spatial Classifier: classifies a topic's ranked chunks by how
//! concentrated or spread out their chunk indices are, and optionally
//! filters on that classification.

use crate::core::scorer::ScoredChunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialMode {
    Auto,
    Concentrated,
    Spread,
}

impl SpatialMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(SpatialMode::Auto),
            "concentrated" => Some(SpatialMode::Concentrated),
            "spread" => Some(SpatialMode::Spread),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialPattern {
    None,
    Single,
    Concentrated,
    Spread,
    Moderate,
}

/// Standard deviation of chunk-number across `chunks` (population stddev).
fn chunk_number_stddev(chunks: &[ScoredChunk]) -> f64 {
    let n = chunks.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean = chunks.iter().map(|c| c.chunk.chunk_number as f64).sum::<f64>() / n;
    let variance = chunks
        .iter()
        .map(|c| {
            let d = c.chunk.chunk_number as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

pub fn classify(chunks: &[ScoredChunk]) -> SpatialPattern {
    match chunks.len() {
        0 => SpatialPattern::None,
        1 => SpatialPattern::Single,
        _ => {
            let stddev = chunk_number_stddev(chunks);
            if stddev < 10.0 {
                SpatialPattern::Concentrated
            } else if stddev > 50.0 {
                SpatialPattern::Spread
            } else {
                SpatialPattern::Moderate
            }
        }
    }
}

/// Apply the spatial filter for `mode`. `auto` is a pass-through;
/// `concentrated`/`spread` keep everything if the pattern matches, or
/// drop the topic's chunks entirely otherwise.
pub fn apply_filter(chunks: Vec<ScoredChunk>, mode: SpatialMode) -> Vec<ScoredChunk> {
    match mode {
        SpatialMode::Auto => chunks,
        SpatialMode::Concentrated => {
            if classify(&chunks) == SpatialPattern::Concentrated {
                chunks
            } else {
                Vec::new()
            }
        }
        SpatialMode::Spread => {
            if classify(&chunks) == SpatialPattern::Spread {
                chunks
            } else {
                Vec::new()
            }
        }
    }
}
