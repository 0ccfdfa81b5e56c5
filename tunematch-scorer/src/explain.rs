//! Explanation Generator
//!
//! Renders the same intermediate values the aggregator used as a short
//! rationale, e.g.
//! `Good match. Key factors: strong theme alignment, good mood compatibility Warning: intensity contradiction`.

use crate::aggregate::IMPORTANT_ASPECT_WEIGHT;
use crate::aspect::{Aspect, AspectContradictions, AspectSimilarities, AspectWeights};

/// Contradiction score above which an important aspect earns a warning
pub const WARNING_CONTRADICTION_SCORE: f64 = 0.5;

fn overall_tier(final_score: f64) -> &'static str {
    if final_score > 0.8 {
        "Excellent match."
    } else if final_score > 0.6 {
        "Good match."
    } else if final_score > 0.4 {
        "Moderate match."
    } else {
        "Poor match."
    }
}

fn describe_factor(aspect: Aspect, similarity: f64, contradiction: f64) -> String {
    if similarity > 0.7 && contradiction < 0.3 {
        format!("strong {aspect} alignment")
    } else if similarity > 0.5 && contradiction < 0.4 {
        format!("good {aspect} compatibility")
    } else if contradiction > WARNING_CONTRADICTION_SCORE {
        format!("significant {aspect} contradiction")
    } else {
        format!("neutral {aspect} relationship")
    }
}

/// Human-readable rationale for one match
///
/// Key factors list every aspect weighted above 0.2, most important first.
/// The trailing warning names every such aspect whose contradiction exceeds
/// 0.5, whether or not it triggered a numeric penalty.
pub fn explain_match(
    weights: &AspectWeights,
    similarities: &AspectSimilarities,
    contradictions: &AspectContradictions,
    final_score: f64,
) -> String {
    let contradiction_score =
        |aspect: Aspect| contradictions.get(&aspect).map(|c| c.score).unwrap_or(0.0);

    let mut explanation = overall_tier(final_score).to_string();

    let factors: Vec<String> = weights
        .by_importance()
        .into_iter()
        .filter(|(_, w)| *w > IMPORTANT_ASPECT_WEIGHT)
        .map(|(aspect, _)| {
            let similarity = similarities.get(&aspect).copied().unwrap_or(0.0);
            describe_factor(aspect, similarity, contradiction_score(aspect))
        })
        .collect();

    if !factors.is_empty() {
        explanation.push_str(" Key factors: ");
        explanation.push_str(&factors.join(", "));
    }

    let warnings: Vec<String> = weights
        .iter()
        .filter(|(aspect, w)| {
            *w > IMPORTANT_ASPECT_WEIGHT
                && contradictions.contains_key(aspect)
                && contradiction_score(*aspect) > WARNING_CONTRADICTION_SCORE
        })
        .map(|(aspect, _)| format!("{aspect} contradiction"))
        .collect();

    if !warnings.is_empty() {
        explanation.push_str(" Warning: ");
        explanation.push_str(&warnings.join(", "));
    }

    explanation
}
