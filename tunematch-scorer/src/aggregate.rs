//! Score Aggregator
//!
//! `final = weighted_similarity * penalty_multiplier`, where the multiplier
//! shrinks by `score * weight * 0.8` for every important aspect (weight above
//! 0.2) carrying a real contradiction (score strictly above 0.4). Minor or
//! unimportant mismatches leave a strong match intact.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::aspect::{AspectContradictions, AspectSimilarities, AspectWeights};
use crate::similarity::NEUTRAL_SIMILARITY;

/// Weight above which an aspect counts as important
pub const IMPORTANT_ASPECT_WEIGHT: f64 = 0.2;
/// Contradiction score above which a penalty applies
pub const PENALTY_TRIGGER_SCORE: f64 = 0.4;
/// Scaling of each penalty factor
pub const PENALTY_SCALE: f64 = 0.8;

/// Intermediate and final values of one aggregation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub weighted_similarity: f64,
    /// Product of penalty factors, in (0, 1]
    pub penalty_multiplier: f64,
    pub final_score: f64,
}

/// Combine per-aspect similarities and contradictions into one score
///
/// Aspects with zero weight do not contribute. An active aspect missing from
/// `similarities` counts as neutral; one missing from `contradictions` is
/// never penalized.
pub fn aggregate_score(
    weights: &AspectWeights,
    similarities: &AspectSimilarities,
    contradictions: &AspectContradictions,
) -> ScoreBreakdown {
    let mut weighted_similarity = 0.0;
    let mut penalty_multiplier = 1.0;

    for (aspect, weight) in weights.iter().filter(|(_, w)| *w > 0.0) {
        let similarity = similarities
            .get(&aspect)
            .copied()
            .unwrap_or(NEUTRAL_SIMILARITY);
        weighted_similarity += weight * similarity;

        if let Some(contradiction) = contradictions.get(&aspect) {
            if weight > IMPORTANT_ASPECT_WEIGHT && contradiction.score > PENALTY_TRIGGER_SCORE {
                let factor = 1.0 - contradiction.score * weight * PENALTY_SCALE;
                trace!(%aspect, weight, contradiction = contradiction.score, factor, "Contradiction penalty");
                penalty_multiplier *= factor;
            }
        }
    }

    ScoreBreakdown {
        weighted_similarity,
        penalty_multiplier,
        final_score: weighted_similarity * penalty_multiplier,
    }
}
