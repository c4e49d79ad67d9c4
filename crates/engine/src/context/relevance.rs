//! Lexical relevance scoring of pool artifacts against a query.
//!
//! No embeddings: a pin dominates, a file name mentioned in the query is a
//! strong hint, and every longer query word found in the content adds a
//! little.

use crate::artifact::{ArtifactPool, LoadedArtifact, PinSet};

/// Additive scoring weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    /// Score assigned to a pinned artifact before other rules add to it.
    pub pinned: u32,
    /// Bonus when the display name appears in the query.
    pub name_in_query: u32,
    /// Bonus per query token found in the content.
    pub keyword_hit: u32,
    /// Query tokens must be strictly longer than this to count.
    pub min_keyword_len: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            pinned: 1000,
            name_in_query: 50,
            keyword_hit: 5,
            min_keyword_len: 4,
        }
    }
}

/// A loaded artifact paired with its score for one query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredArtifact<'a> {
    pub artifact: &'a LoadedArtifact,
    pub score: u32,
}

/// Score one artifact.
pub fn score_artifact(
    query: &str,
    artifact: &LoadedArtifact,
    pins: &PinSet,
    weights: &ScoringWeights,
) -> u32 {
    let query_lower = query.to_lowercase();
    score_lowered(&query_lower, artifact, pins, weights)
}

fn score_lowered(
    query_lower: &str,
    artifact: &LoadedArtifact,
    pins: &PinSet,
    weights: &ScoringWeights,
) -> u32 {
    let mut score = 0;
    if pins.matches(artifact) {
        score = weights.pinned;
    }

    if query_lower.contains(&artifact.name.to_lowercase()) {
        score += weights.name_in_query;
    }

    let content_lower = artifact.content.to_lowercase();
    for word in query_lower.split_whitespace() {
        if word.chars().count() > weights.min_keyword_len && content_lower.contains(word) {
            score += weights.keyword_hit;
        }
    }

    score
}

/// Score every loaded artifact in the pool and sort by score, highest first.
///
/// The sort is stable, so equal scores keep pool (path) order. Failed
/// records are never visited.
pub fn score_artifacts<'a>(
    query: &str,
    pool: &'a ArtifactPool,
    pins: &PinSet,
    weights: &ScoringWeights,
) -> Vec<ScoredArtifact<'a>> {
    let query_lower = query.to_lowercase();
    let mut scored: Vec<ScoredArtifact<'a>> = pool
        .loaded()
        .map(|artifact| ScoredArtifact {
            artifact,
            score: score_lowered(&query_lower, artifact, pins, weights),
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}
