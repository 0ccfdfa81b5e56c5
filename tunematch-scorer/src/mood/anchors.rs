//! Keyword anchor vocabularies for dimensional mood analysis
//!
//! Anchors are versioned data, not code: the built-in set can be replaced by a
//! TOML file (`mood.anchors_file`) of the form
//!
//! ```toml
//! version = "emotional-anchors-v2"
//!
//! [valence]
//! primary = ["happy", "joyful"]
//! opposite = ["sad", "gloomy"]
//!
//! [arousal]
//! primary = ["energetic"]
//! opposite = ["calm"]
//!
//! [dominance]
//! primary = ["confident"]
//! opposite = ["vulnerable"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::EmotionalDimension;
use crate::error::{ScoringError, ScoringResult};

/// Version tag of the built-in vocabularies
pub const DEFAULT_ANCHORS_VERSION: &str = "emotional-anchors-v1";

/// Keywords anchoring the two poles of one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poles {
    /// Positive / high-energy / empowering pole
    pub primary: Vec<String>,
    /// Negative / low-energy / vulnerable pole
    pub opposite: Vec<String>,
}

impl Poles {
    fn from_words(primary: &[&str], opposite: &[&str]) -> Self {
        Self {
            primary: primary.iter().map(|w| w.to_string()).collect(),
            opposite: opposite.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Anchor vocabularies for valence, arousal and dominance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodAnchors {
    pub version: String,
    pub valence: Poles,
    pub arousal: Poles,
    pub dominance: Poles,
}

impl Default for MoodAnchors {
    fn default() -> Self {
        Self {
            version: DEFAULT_ANCHORS_VERSION.to_string(),
            valence: Poles::from_words(
                &[
                    "happy", "joyful", "uplifting", "optimistic", "cheerful", "hopeful", "content",
                    "satisfied", "peaceful",
                ],
                &[
                    "sad", "melancholy", "depressing", "gloomy", "angry", "frustrated", "anxious",
                    "fearful", "resentful",
                ],
            ),
            arousal: Poles::from_words(
                &[
                    "energetic", "exciting", "intense", "powerful", "dynamic", "lively",
                    "passionate", "vigorous",
                ],
                &[
                    "calm", "relaxing", "soothing", "gentle", "mellow", "tranquil", "serene",
                    "peaceful",
                ],
            ),
            dominance: Poles::from_words(
                &[
                    "confident", "strong", "empowering", "bold", "assertive", "determined",
                    "resilient",
                ],
                &[
                    "vulnerable", "sensitive", "intimate", "delicate", "fragile", "uncertain",
                    "insecure",
                ],
            ),
        }
    }
}

impl MoodAnchors {
    /// Parse and validate anchors from TOML text
    pub fn from_toml_str(content: &str) -> ScoringResult<Self> {
        let anchors: MoodAnchors = toml::from_str(content)
            .map_err(|e| ScoringError::InvalidAnchors(format!("Failed to parse anchors: {}", e)))?;
        anchors.validate()?;
        Ok(anchors)
    }

    /// Load and validate anchors from a TOML file
    pub fn load(path: &Path) -> ScoringResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScoringError::InvalidAnchors(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Every pole needs at least one non-blank keyword
    pub fn validate(&self) -> ScoringResult<()> {
        if self.version.trim().is_empty() {
            return Err(ScoringError::InvalidAnchors(
                "version must not be empty".to_string(),
            ));
        }

        for dimension in EmotionalDimension::ALL {
            let poles = self.poles(dimension);
            let (primary, opposite) = dimension.categories();
            for (category, words) in [(primary, &poles.primary), (opposite, &poles.opposite)] {
                if words.is_empty() {
                    return Err(ScoringError::InvalidAnchors(format!(
                        "{} '{}' has no keywords",
                        dimension, category
                    )));
                }
                if words.iter().any(|w| w.trim().is_empty()) {
                    return Err(ScoringError::InvalidAnchors(format!(
                        "{} '{}' contains a blank keyword",
                        dimension, category
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn poles(&self, dimension: EmotionalDimension) -> &Poles {
        match dimension {
            EmotionalDimension::Valence => &self.valence,
            EmotionalDimension::Arousal => &self.arousal,
            EmotionalDimension::Dominance => &self.dominance,
        }
    }

    /// Total keyword count across all poles
    pub fn keyword_count(&self) -> usize {
        EmotionalDimension::ALL
            .iter()
            .map(|d| {
                let poles = self.poles(*d);
                poles.primary.len() + poles.opposite.len()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_anchors_are_valid() {
        let anchors = MoodAnchors::default();
        anchors.validate().unwrap();
        assert_eq!(anchors.version, DEFAULT_ANCHORS_VERSION);
        assert_eq!(anchors.keyword_count(), 9 + 9 + 8 + 8 + 7 + 7);
        assert!(anchors.valence.primary.contains(&"peaceful".to_string()));
        assert!(anchors.arousal.opposite.contains(&"peaceful".to_string()));
    }

    #[test]
    fn test_default_anchors_survive_toml_round_trip() {
        let text = toml::to_string(&MoodAnchors::default()).unwrap();
        let parsed = MoodAnchors::from_toml_str(&text).unwrap();
        assert_eq!(parsed, MoodAnchors::default());
    }

    #[test]
    fn test_empty_pole_rejected() {
        let content = r#"
            version = "custom"
            [valence]
            primary = ["happy"]
            opposite = []
            [arousal]
            primary = ["energetic"]
            opposite = ["calm"]
            [dominance]
            primary = ["bold"]
            opposite = ["fragile"]
        "#;

        let result = MoodAnchors::from_toml_str(content);

        match result {
            Err(ScoringError::InvalidAnchors(message)) => {
                assert!(message.contains("valence"), "{message}")
            }
            other => panic!("expected InvalidAnchors, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_dimension_rejected() {
        let result = MoodAnchors::from_toml_str("version = \"v\"\n[valence]\nprimary=[\"a\"]\nopposite=[\"b\"]\n");
        assert!(matches!(result, Err(ScoringError::InvalidAnchors(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("anchors.toml");
        let mut anchors = MoodAnchors::default();
        anchors.version = "emotional-anchors-v2".to_string();
        anchors.dominance.primary.push("fearless".to_string());
        std::fs::write(&path, toml::to_string(&anchors).unwrap()).unwrap();

        let loaded = MoodAnchors::load(&path).unwrap();

        assert_eq!(loaded, anchors);
    }

    #[test]
    fn test_load_missing_file_is_invalid_anchors() {
        let result = MoodAnchors::load(Path::new("/nonexistent/anchors.toml"));
        assert!(matches!(result, Err(ScoringError::InvalidAnchors(_))));
    }
}
