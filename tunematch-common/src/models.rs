//! Profile data model shared by playlists and songs
//!
//! The upstream lyric-analysis step emits profiles in a nested shape
//! (`meaning` / `emotional` / `context` sections). [`Profile`] is the flat, typed
//! view of that payload: every section and field may be absent on the wire, and
//! absence is represented as an empty `Vec` or `None` rather than a silent miss.

use serde::{Deserialize, Serialize};

/// Confidence assumed for a theme that does not carry one
pub const DEFAULT_THEME_CONFIDENCE: f64 = 0.5;

fn default_theme_confidence() -> f64 {
    DEFAULT_THEME_CONFIDENCE
}

/// Named, described topical element of a playlist or song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Analysis confidence (0.0-1.0)
    #[serde(default = "default_theme_confidence")]
    pub confidence: f64,
}

impl Theme {
    pub fn new(name: impl Into<String>, description: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            confidence,
        }
    }
}

/// Primary emotional descriptor of a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DominantMood {
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub description: String,
}

impl DominantMood {
    pub fn new(mood: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            mood: mood.into(),
            description: description.into(),
        }
    }

    /// True when both the mood name and its description are present
    pub fn is_complete(&self) -> bool {
        !self.mood.trim().is_empty() && !self.description.trim().is_empty()
    }

    fn is_blank(&self) -> bool {
        self.mood.trim().is_empty() && self.description.trim().is_empty()
    }
}

/// One step of a profile's emotional progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodStep {
    #[serde(default)]
    pub mood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Semantic analysis of a playlist or a song
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileWire", into = "ProfileWire")]
pub struct Profile {
    pub themes: Vec<Theme>,
    pub dominant_mood: Option<DominantMood>,
    /// Explicit intensity (0.0-1.0). `Some(0.0)` is a real value, not absence.
    pub intensity_score: Option<f64>,
    pub progression: Vec<MoodStep>,
    pub activities: Vec<String>,
    pub primary_setting: Option<String>,
}

/// Embedding model variant served by the embedding service
///
/// Each variant has a fixed output dimensionality; vectors from different
/// variants are never comparable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// all-MiniLM-L6-v2
    #[default]
    General,
    /// all-mpnet-base-v2
    Creative,
    /// multi-qa-mpnet-base-dot-v1
    Semantic,
    /// paraphrase-MiniLM-L3-v2
    Fast,
}

impl ModelVariant {
    /// Output dimensionality of this variant
    pub fn dimension(&self) -> usize {
        match self {
            ModelVariant::General | ModelVariant::Fast => 384,
            ModelVariant::Creative | ModelVariant::Semantic => 768,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::General => "general",
            ModelVariant::Creative => "creative",
            ModelVariant::Semantic => "semantic",
            ModelVariant::Fast => "fast",
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelVariant {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(ModelVariant::General),
            "creative" => Ok(ModelVariant::Creative),
            "semantic" => Ok(ModelVariant::Semantic),
            "fast" => Ok(ModelVariant::Fast),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown model variant '{}' (expected general, creative, semantic or fast)",
                other
            ))),
        }
    }
}

/// Track metadata carried through scoring unmodified
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
}

impl TrackInfo {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

impl std::fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Human-judged reference score used by evaluation runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub score: f64,
}

/// Candidate song: track metadata plus its analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongEntry {
    pub track: TrackInfo,
    #[serde(default)]
    pub analysis: Profile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<GroundTruth>,
}

/// Ranking request: one playlist profile and its candidate songs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRequest {
    pub playlist: Profile,
    #[serde(default)]
    pub songs: Vec<SongEntry>,
}

/// Mood-compatibility request: one playlist mood against any number of song moods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodRequest {
    pub playlist_mood: DominantMood,
    #[serde(default)]
    pub song_moods: Vec<DominantMood>,
}

// ============================================================================
// Wire shape
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProfileWire {
    #[serde(default)]
    meaning: Option<MeaningSection>,
    #[serde(default)]
    emotional: Option<EmotionalSection>,
    #[serde(default)]
    context: Option<ContextSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MeaningSection {
    #[serde(default)]
    themes: Option<Vec<Theme>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmotionalSection {
    #[serde(rename = "dominantMood", default, skip_serializing_if = "Option::is_none")]
    dominant_mood: Option<DominantMood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intensity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    progression: Option<Vec<MoodStep>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ContextSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    primary_setting: Option<String>,
    #[serde(default)]
    situations: Option<Situations>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Situations {
    #[serde(default)]
    perfect_for: Option<Vec<String>>,
}

impl From<ProfileWire> for Profile {
    fn from(wire: ProfileWire) -> Self {
        let meaning = wire.meaning.unwrap_or_default();
        let emotional = wire.emotional.unwrap_or_default();
        let context = wire.context.unwrap_or_default();

        Self {
            themes: meaning.themes.unwrap_or_default(),
            // An empty `dominantMood: {}` object carries no information
            dominant_mood: emotional.dominant_mood.filter(|m| !m.is_blank()),
            intensity_score: emotional.intensity_score,
            progression: emotional.progression.unwrap_or_default(),
            activities: context
                .situations
                .and_then(|s| s.perfect_for)
                .unwrap_or_default(),
            primary_setting: context.primary_setting.filter(|s| !s.trim().is_empty()),
        }
    }
}

impl From<Profile> for ProfileWire {
    fn from(profile: Profile) -> Self {
        Self {
            meaning: Some(MeaningSection {
                themes: Some(profile.themes),
            }),
            emotional: Some(EmotionalSection {
                dominant_mood: profile.dominant_mood,
                intensity_score: profile.intensity_score,
                progression: Some(profile.progression),
            }),
            context: Some(ContextSection {
                primary_setting: profile.primary_setting,
                situations: Some(Situations {
                    perfect_for: Some(profile.activities),
                }),
            }),
        }
    }
}
