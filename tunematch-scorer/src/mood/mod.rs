//! Dimensional Mood Compatibility
//!
//! Alternative to aspect-based matching for callers that only have two mood
//! descriptions. Each mood is placed on three emotional dimensions by
//! comparing its embedding with anchor keyword embeddings:
//!
//! | Dimension | Poles                   | Weight |
//! |-----------|-------------------------|--------|
//! | valence   | positive / negative     | 0.5    |
//! | arousal   | high / low              | 0.3    |
//! | dominance | empowering / vulnerable | 0.2    |
//!
//! A pole's score is the best cosine similarity against any of its keywords.
//! Per-dimension compatibility is `1 - mean(|playlist - song|)` over the two
//! poles, and the final score blends `0.6 * semantic + 0.4 * dimensional`,
//! where `semantic` is the cosine similarity of the two full mood texts.
//! No contradiction penalty applies on this path.

pub mod anchors;

pub use anchors::{MoodAnchors, Poles};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use tunematch_common::{DominantMood, ModelVariant, MoodRequest};

use crate::aspect::Aspect;
use crate::embedding::{Embedding, EmbeddingProvider};
use crate::error::{ScoringError, ScoringResult};
use crate::ranker::{rank_key, RankOptions};
use crate::similarity::cosine_similarity;

/// Share of the final mood score taken by direct semantic similarity
pub const SEMANTIC_BLEND_WEIGHT: f64 = 0.6;
/// Share of the final mood score taken by the dimensional score
pub const DIMENSIONAL_BLEND_WEIGHT: f64 = 0.4;

/// Fixed emotional dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalDimension {
    Valence,
    Arousal,
    Dominance,
}

impl EmotionalDimension {
    pub const ALL: [EmotionalDimension; 3] = [
        EmotionalDimension::Valence,
        EmotionalDimension::Arousal,
        EmotionalDimension::Dominance,
    ];

    /// Weight of this dimension in the dimensional score
    pub fn weight(&self) -> f64 {
        match self {
            EmotionalDimension::Valence => 0.5,
            EmotionalDimension::Arousal => 0.3,
            EmotionalDimension::Dominance => 0.2,
        }
    }

    /// Names of the (primary, opposite) poles
    pub fn categories(&self) -> (&'static str, &'static str) {
        match self {
            EmotionalDimension::Valence => ("positive", "negative"),
            EmotionalDimension::Arousal => ("high", "low"),
            EmotionalDimension::Dominance => ("empowering", "vulnerable"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalDimension::Valence => "valence",
            EmotionalDimension::Arousal => "arousal",
            EmotionalDimension::Dominance => "dominance",
        }
    }
}

impl std::fmt::Display for EmotionalDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closeness of a mood to each pole of one dimension
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoleScores {
    pub primary: f64,
    pub opposite: f64,
}

/// Placement of one mood text on every dimension
pub type MoodClassification = BTreeMap<EmotionalDimension, PoleScores>;

/// Per-dimension comparison of two moods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: EmotionalDimension,
    pub playlist: PoleScores,
    pub song: PoleScores,
    pub compatibility: f64,
}

/// Result of comparing a playlist mood with a song mood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodCompatibility {
    pub score: f64,
    pub semantic_similarity: f64,
    pub dimensional_score: f64,
    /// Valence, arousal, dominance in that order
    pub dimension_scores: Vec<DimensionScore>,
    pub explanation: String,
}

impl MoodCompatibility {
    pub fn dimension(&self, dimension: EmotionalDimension) -> Option<&DimensionScore> {
        self.dimension_scores.iter().find(|d| d.dimension == dimension)
    }
}

/// Song mood compared against a playlist mood, for ranked output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodMatch {
    pub song_index: usize,
    pub song_mood: String,
    pub compatibility: MoodCompatibility,
}

/// `1 - mean(|a - b|)` over both poles
pub fn dimension_compatibility(playlist: &PoleScores, song: &PoleScores) -> f64 {
    let diff = (playlist.primary - song.primary).abs() + (playlist.opposite - song.opposite).abs();
    1.0 - diff / 2.0
}

/// Weighted sum of per-dimension compatibilities
pub fn dimensional_score(dimension_scores: &[DimensionScore]) -> f64 {
    dimension_scores
        .iter()
        .map(|d| d.dimension.weight() * d.compatibility)
        .sum()
}

pub fn blend_mood_score(semantic_similarity: f64, dimensional: f64) -> f64 {
    SEMANTIC_BLEND_WEIGHT * semantic_similarity + DIMENSIONAL_BLEND_WEIGHT * dimensional
}

fn display_name(mood: &DominantMood) -> &str {
    let name = mood.mood.trim();
    if name.is_empty() {
        "Unknown"
    } else {
        name
    }
}

/// Human-readable rationale for a mood comparison
///
/// `valence_diff` compares the positive pole, `arousal_diff` the high pole.
pub fn explain_mood(
    playlist: &DominantMood,
    song: &DominantMood,
    score: f64,
    valence_diff: f64,
    arousal_diff: f64,
) -> String {
    let pair = format!("'{}' and '{}'", display_name(playlist), display_name(song));

    if score > 0.8 {
        format!("Strong mood compatibility between {pair}. Both share similar emotional qualities.")
    } else if score > 0.6 {
        let detail = if valence_diff < 0.3 {
            "They share similar emotional valence (positivity/negativity)."
        } else {
            "They have complementary energy levels despite some differences in tone."
        };
        format!("Good mood compatibility between {pair}. {detail}")
    } else if score > 0.4 {
        let detail = if valence_diff > 0.4 {
            "They differ in emotional tone (positive vs negative)."
        } else if arousal_diff > 0.4 {
            "They differ significantly in energy level."
        } else {
            "They have some emotional similarities but differ in key aspects."
        };
        format!("Moderate mood compatibility between {pair}. {detail}")
    } else {
        format!("Low mood compatibility between {pair}. They represent contrasting emotional states.")
    }
}

fn mood_text(mood: &DominantMood) -> String {
    format!("{} {}", mood.mood, mood.description).trim().to_string()
}

struct AnchorEmbeddings {
    primary: Vec<Embedding>,
    opposite: Vec<Embedding>,
}

/// One mood's full-text embedding and dimensional placement
struct MoodReading {
    embedding: Embedding,
    classification: MoodClassification,
}

/// Dimensional mood analyzer
///
/// Anchor keywords are embedded once at construction; each comparison then
/// costs at most two embeddings per mood (full text and lowercased
/// classification text, one call when they are the same). Every embedding
/// call honors the deadline and cancellation token of the [`RankOptions`].
pub struct MoodAnalyzer {
    provider: Arc<dyn EmbeddingProvider>,
    model: ModelVariant,
    anchors: MoodAnchors,
    anchor_embeddings: BTreeMap<EmotionalDimension, AnchorEmbeddings>,
}

impl MoodAnalyzer {
    /// Validate `anchors` and embed every keyword
    pub async fn new(
        provider: Arc<dyn EmbeddingProvider>,
        anchors: MoodAnchors,
        model: ModelVariant,
    ) -> ScoringResult<Self> {
        anchors.validate()?;

        let mut anchor_embeddings = BTreeMap::new();
        for dimension in EmotionalDimension::ALL {
            let poles = anchors.poles(dimension);
            let primary = provider
                .embed_batch(&poles.primary, model)
                .await
                .map_err(|source| anchor_error(dimension, source))?;
            let opposite = provider
                .embed_batch(&poles.opposite, model)
                .await
                .map_err(|source| anchor_error(dimension, source))?;
            anchor_embeddings.insert(dimension, AnchorEmbeddings { primary, opposite });
        }

        info!(
            version = %anchors.version,
            keywords = anchors.keyword_count(),
            model = %model,
            "Mood anchors embedded"
        );

        Ok(Self {
            provider,
            model,
            anchors,
            anchor_embeddings,
        })
    }

    pub fn anchors(&self) -> &MoodAnchors {
        &self.anchors
    }

    /// Place a mood text on every dimension
    pub async fn classify(
        &self,
        text: &str,
        options: &RankOptions,
    ) -> ScoringResult<MoodClassification> {
        let lowered = text.to_lowercase();
        let embedding = until_cancelled(options, self.embed("mood text", &lowered, options)).await?;
        self.classify_embedding(&embedding)
    }

    /// Compare one playlist mood with one song mood
    pub async fn compatibility(
        &self,
        playlist: &DominantMood,
        song: &DominantMood,
        options: &RankOptions,
    ) -> ScoringResult<MoodCompatibility> {
        let readings = async {
            futures::try_join!(
                self.read("playlist mood", playlist, options),
                self.read("song mood", song, options)
            )
        };
        let (playlist_reading, song_reading) = until_cancelled(options, readings).await?;
        self.combine(playlist, &playlist_reading, song, &song_reading)
    }

    /// Compare every song mood of `request` with its playlist mood
    ///
    /// Sorted by score descending; equal scores keep input order.
    pub async fn rank_song_moods(
        &self,
        request: &MoodRequest,
        options: &RankOptions,
    ) -> ScoringResult<Vec<MoodMatch>> {
        let playlist_reading = until_cancelled(
            options,
            self.read("playlist mood", &request.playlist_mood, options),
        )
        .await?;

        let song_readings = join_all(
            request
                .song_moods
                .iter()
                .map(|song| self.read("song mood", song, options)),
        );
        let readings = until_cancelled(options, async { Ok(song_readings.await) }).await?;

        let mut matches = Vec::with_capacity(readings.len());
        for (song_index, (song, reading)) in request.song_moods.iter().zip(readings).enumerate() {
            let compatibility =
                self.combine(&request.playlist_mood, &playlist_reading, song, &reading?)?;
            matches.push(MoodMatch {
                song_index,
                song_mood: display_name(song).to_string(),
                compatibility,
            });
        }

        matches.sort_by(|a, b| {
            rank_key(b.compatibility.score).total_cmp(&rank_key(a.compatibility.score))
        });
        Ok(matches)
    }

    async fn read(
        &self,
        subject: &str,
        mood: &DominantMood,
        options: &RankOptions,
    ) -> ScoringResult<MoodReading> {
        let text = mood_text(mood);
        let lowered = text.to_lowercase();
        let (embedding, classification_embedding) = if lowered == text {
            let embedding = self.embed(subject, &text, options).await?;
            (embedding.clone(), embedding)
        } else {
            futures::try_join!(
                self.embed(subject, &text, options),
                self.embed(subject, &lowered, options)
            )?
        };
        let classification = self.classify_embedding(&classification_embedding)?;
        Ok(MoodReading {
            embedding,
            classification,
        })
    }

    fn combine(
        &self,
        playlist: &DominantMood,
        playlist_reading: &MoodReading,
        song: &DominantMood,
        song_reading: &MoodReading,
    ) -> ScoringResult<MoodCompatibility> {
        let semantic_similarity =
            cosine_similarity(&playlist_reading.embedding.vector, &song_reading.embedding.vector)?;

        let dimension_scores: Vec<DimensionScore> = EmotionalDimension::ALL
            .iter()
            .map(|&dimension| {
                let playlist_scores = pole_scores(&playlist_reading.classification, dimension);
                let song_scores = pole_scores(&song_reading.classification, dimension);
                DimensionScore {
                    dimension,
                    playlist: playlist_scores,
                    song: song_scores,
                    compatibility: dimension_compatibility(&playlist_scores, &song_scores),
                }
            })
            .collect();

        let dimensional = dimensional_score(&dimension_scores);
        let score = blend_mood_score(semantic_similarity, dimensional);

        let pole_diff = |dimension: EmotionalDimension| {
            let playlist_scores = pole_scores(&playlist_reading.classification, dimension);
            let song_scores = pole_scores(&song_reading.classification, dimension);
            (playlist_scores.primary - song_scores.primary).abs()
        };
        let explanation = explain_mood(
            playlist,
            song,
            score,
            pole_diff(EmotionalDimension::Valence),
            pole_diff(EmotionalDimension::Arousal),
        );

        debug!(
            playlist_mood = %display_name(playlist),
            song_mood = %display_name(song),
            semantic = semantic_similarity,
            dimensional,
            score,
            "Mood compared"
        );

        Ok(MoodCompatibility {
            score,
            semantic_similarity,
            dimensional_score: dimensional,
            dimension_scores,
            explanation,
        })
    }

    fn classify_embedding(&self, embedding: &Embedding) -> ScoringResult<MoodClassification> {
        let mut classification = MoodClassification::new();
        for (dimension, anchors) in &self.anchor_embeddings {
            classification.insert(
                *dimension,
                PoleScores {
                    primary: best_match(embedding, &anchors.primary)?,
                    opposite: best_match(embedding, &anchors.opposite)?,
                },
            );
        }
        Ok(classification)
    }

    async fn embed(
        &self,
        subject: &str,
        text: &str,
        options: &RankOptions,
    ) -> ScoringResult<Embedding> {
        let call = self.provider.embed(text, self.model);
        let outcome = match options.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, call).await.map_err(|_| {
                ScoringError::DeadlineExceeded {
                    subject: subject.to_string(),
                    aspect: Aspect::Mood,
                }
            })?,
            None => call.await,
        };

        outcome.map_err(|source| ScoringError::EmbeddingUnavailable {
            subject: subject.to_string(),
            aspect: Aspect::Mood,
            source,
        })
    }
}

/// Run `work` unless `options` is cancelled first
async fn until_cancelled<T>(
    options: &RankOptions,
    work: impl Future<Output = ScoringResult<T>>,
) -> ScoringResult<T> {
    tokio::select! {
        biased;
        _ = options.cancel.cancelled() => Err(ScoringError::Cancelled),
        result = work => result,
    }
}

fn anchor_error(dimension: EmotionalDimension, source: crate::embedding::EmbeddingError) -> ScoringError {
    ScoringError::EmbeddingUnavailable {
        subject: format!("{} anchors", dimension),
        aspect: Aspect::Mood,
        source,
    }
}

fn pole_scores(classification: &MoodClassification, dimension: EmotionalDimension) -> PoleScores {
    classification.get(&dimension).copied().unwrap_or_default()
}

/// Highest cosine similarity between `embedding` and any keyword
fn best_match(embedding: &Embedding, keywords: &[Embedding]) -> ScoringResult<f64> {
    let mut best = f64::NEG_INFINITY;
    for keyword in keywords {
        best = best.max(cosine_similarity(&embedding.vector, &keyword.vector)?);
    }
    // Validated anchors never leave a pole empty
    Ok(if best.is_finite() { best } else { 0.0 })
}
