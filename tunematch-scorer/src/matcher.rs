//! Per-song match assembly
//!
//! Turns the aspect similarities of one (playlist, song) pair into an
//! immutable [`MatchResult`]: contradictions, aggregated score, explanation.

use serde::{Deserialize, Serialize};
use tunematch_common::TrackInfo;

use crate::aggregate::aggregate_score;
use crate::aspect::{AspectContradictions, AspectSimilarities, AspectWeights};
use crate::contradiction::detect_contradiction;
use crate::explain::explain_match;

/// Outcome of scoring one song against one playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Position of the song in the request
    pub song_index: usize,
    pub track_info: TrackInfo,
    pub final_score: f64,
    pub aspect_weights: AspectWeights,
    pub aspect_similarities: AspectSimilarities,
    pub contradictions: AspectContradictions,
    pub explanation: String,
}

/// Build the match result for one song from its aspect similarities
pub fn score_match(
    song_index: usize,
    track_info: TrackInfo,
    weights: &AspectWeights,
    similarities: AspectSimilarities,
) -> MatchResult {
    let contradictions: AspectContradictions = similarities
        .iter()
        .map(|(aspect, similarity)| (*aspect, detect_contradiction(*similarity)))
        .collect();

    let breakdown = aggregate_score(weights, &similarities, &contradictions);
    let explanation = explain_match(weights, &similarities, &contradictions, breakdown.final_score);

    MatchResult {
        song_index,
        track_info,
        final_score: breakdown.final_score,
        aspect_weights: *weights,
        aspect_similarities: similarities,
        contradictions,
        explanation,
    }
}
