//! Contradiction Detector

use serde::{Deserialize, Serialize};

use crate::aspect::Aspect;

/// Qualitative contradiction band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContradictionLevel {
    None,
    Minor,
    Moderate,
    Significant,
    Major,
}

impl ContradictionLevel {
    /// Band for a contradiction score
    pub fn from_score(score: f64) -> Self {
        if score < 0.2 {
            ContradictionLevel::None
        } else if score < 0.4 {
            ContradictionLevel::Minor
        } else if score < 0.6 {
            ContradictionLevel::Moderate
        } else if score < 0.8 {
            ContradictionLevel::Significant
        } else {
            ContradictionLevel::Major
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContradictionLevel::None => "none",
            ContradictionLevel::Minor => "minor",
            ContradictionLevel::Moderate => "moderate",
            ContradictionLevel::Significant => "significant",
            ContradictionLevel::Major => "major",
        }
    }
}

impl std::fmt::Display for ContradictionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded dissimilarity within one aspect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContradictionResult {
    /// 0.0 (identical) to 1.0 (opposite)
    pub score: f64,
    pub label: ContradictionLevel,
}

impl ContradictionResult {
    /// One-sentence description for `aspect`
    pub fn describe(&self, aspect: Aspect) -> String {
        match self.label {
            ContradictionLevel::None => {
                format!("No significant {aspect} contradiction detected.")
            }
            ContradictionLevel::Minor => format!("Minor {aspect} contradiction detected."),
            ContradictionLevel::Moderate => format!("Moderate {aspect} contradiction detected."),
            ContradictionLevel::Significant => {
                format!("Significant {aspect} contradiction detected.")
            }
            ContradictionLevel::Major => {
                format!("Major {aspect} contradiction detected. These {aspect}s are opposites.")
            }
        }
    }
}

/// Contradiction implied by an aspect similarity
///
/// `score = 1 - similarity`, clamped to [0, 1]. Total: negative cosine
/// similarities saturate at 1.0 rather than escaping the range.
pub fn detect_contradiction(similarity: f64) -> ContradictionResult {
    let score = if similarity.is_nan() {
        0.5
    } else {
        (1.0 - similarity).clamp(0.0, 1.0)
    };

    ContradictionResult {
        score,
        label: ContradictionLevel::from_score(score),
    }
}
