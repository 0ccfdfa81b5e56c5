//! Aspects: the independently scored facets of playlist/song compatibility

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::contradiction::ContradictionResult;

/// One facet of compatibility
///
/// Declaration order is the canonical order; every per-aspect map iterates in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    Theme,
    Mood,
    Activity,
    Intensity,
}

impl Aspect {
    /// All aspects in canonical order
    pub const ALL: [Aspect; 4] = [Aspect::Theme, Aspect::Mood, Aspect::Activity, Aspect::Intensity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aspect::Theme => "theme",
            Aspect::Mood => "mood",
            Aspect::Activity => "activity",
            Aspect::Intensity => "intensity",
        }
    }
}

impl std::fmt::Display for Aspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-aspect similarity (only aspects that were scored)
pub type AspectSimilarities = BTreeMap<Aspect, f64>;

/// Per-aspect contradiction (only aspects that were scored)
pub type AspectContradictions = BTreeMap<Aspect, ContradictionResult>;

/// Importance of each aspect for one playlist
///
/// Produced by [`crate::weights::extract_aspect_weights`]: values are >= 0 and
/// sum to 1.0 within floating tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectWeights {
    pub theme: f64,
    pub mood: f64,
    pub activity: f64,
    pub intensity: f64,
}

impl AspectWeights {
    /// Equal weight for every aspect
    pub fn uniform() -> Self {
        Self {
            theme: 0.25,
            mood: 0.25,
            activity: 0.25,
            intensity: 0.25,
        }
    }

    pub fn get(&self, aspect: Aspect) -> f64 {
        match aspect {
            Aspect::Theme => self.theme,
            Aspect::Mood => self.mood,
            Aspect::Activity => self.activity,
            Aspect::Intensity => self.intensity,
        }
    }

    /// (aspect, weight) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Aspect, f64)> + '_ {
        Aspect::ALL.into_iter().map(move |a| (a, self.get(a)))
    }

    pub fn sum(&self) -> f64 {
        self.theme + self.mood + self.activity + self.intensity
    }

    /// Aspects carrying any weight, in canonical order
    pub fn active_aspects(&self) -> Vec<Aspect> {
        self.iter().filter(|(_, w)| *w > 0.0).map(|(a, _)| a).collect()
    }

    /// Aspects ordered by descending weight; equal weights keep canonical order
    pub fn by_importance(&self) -> Vec<(Aspect, f64)> {
        let mut ordered: Vec<(Aspect, f64)> = self.iter().collect();
        // sort_by is stable
        ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_weights_sum_to_one() {
        let weights = AspectWeights::uniform();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert_eq!(weights.active_aspects(), Aspect::ALL.to_vec());
    }

    #[test]
    fn test_by_importance_is_stable_on_ties() {
        let weights = AspectWeights {
            theme: 0.2,
            mood: 0.4,
            activity: 0.2,
            intensity: 0.2,
        };

        let order: Vec<Aspect> = weights.by_importance().into_iter().map(|(a, _)| a).collect();

        assert_eq!(
            order,
            vec![Aspect::Mood, Aspect::Theme, Aspect::Activity, Aspect::Intensity]
        );
    }

    #[test]
    fn test_aspect_serializes_lowercase_map_keys() {
        let mut sims = AspectSimilarities::new();
        sims.insert(Aspect::Intensity, 0.6);
        sims.insert(Aspect::Theme, 0.9);

        let json = serde_json::to_string(&sims).unwrap();

        assert_eq!(json, r#"{"theme":0.9,"intensity":0.6}"#);
    }
}
