//! Deterministic in-process embedding provider for tests
//!
//! Text is lowercased and split into words. Each recognized word adds 1.0 to
//! one dimension and the sum is L2-normalized:
//! - emotional vocabulary words map to dimensions 0-5 (positive, negative,
//!   high, low, empowering, vulnerable)
//! - `tN` maps to dimension N
//!
//! Control words, never part of the vector:
//! - `waitN` sleeps N milliseconds before answering
//! - `boom` fails with a network error
//! - `shrink` answers with an 8-dimensional vector

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tunematch_common::{DominantMood, ModelVariant, Profile, SongEntry, Theme, TrackInfo};
use tunematch_scorer::embedding::is_blank;
use tunematch_scorer::{Embedding, EmbeddingError, EmbeddingProvider};

const CLUSTERS: &[(usize, &[&str])] = &[
    (
        0,
        &[
            "happy", "joyful", "uplifting", "optimistic", "cheerful", "hopeful", "content",
            "satisfied", "peaceful",
        ],
    ),
    (
        1,
        &[
            "sad", "melancholy", "depressing", "gloomy", "angry", "frustrated", "anxious",
            "fearful", "resentful", "reflective",
        ],
    ),
    (
        2,
        &[
            "energetic", "exciting", "intense", "powerful", "dynamic", "lively", "passionate",
            "vigorous",
        ],
    ),
    (
        3,
        &["calm", "relaxing", "soothing", "gentle", "mellow", "tranquil", "serene"],
    ),
    (
        4,
        &["confident", "strong", "empowering", "bold", "assertive", "determined", "resilient"],
    ),
    (
        5,
        &["vulnerable", "sensitive", "intimate", "delicate", "fragile", "uncertain", "insecure"],
    ),
];

#[derive(Default)]
pub struct KeywordProvider {
    calls: AtomicUsize,
}

impl KeywordProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-blank texts embedded so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

fn numbered(word: &str, prefix: &str) -> Option<usize> {
    word.strip_prefix(prefix)?.parse().ok()
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn embed(&self, text: &str, model: ModelVariant) -> Result<Embedding, EmbeddingError> {
        if is_blank(text) {
            return Ok(Embedding::zeros(model));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let words = words(text);

        for word in &words {
            if let Some(ms) = numbered(word, "wait") {
                tokio::time::sleep(Duration::from_millis(ms as u64)).await;
            }
        }
        if words.iter().any(|w| w == "boom") {
            return Err(EmbeddingError::Network("connection reset".to_string()));
        }
        if words.iter().any(|w| w == "shrink") {
            return Ok(Embedding::new(vec![1.0; 8], model));
        }

        let dimension = model.dimension();
        let mut vector = vec![0.0_f32; dimension];
        for word in &words {
            if let Some(index) = numbered(word, "t").filter(|i| *i < dimension) {
                vector[index] += 1.0;
                continue;
            }
            if let Some((index, _)) = CLUSTERS.iter().find(|(_, ws)| ws.contains(&word.as_str())) {
                vector[*index] += 1.0;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(Embedding::new(vector, model))
    }
}

pub fn song(title: &str, analysis: Profile) -> SongEntry {
    SongEntry {
        track: TrackInfo::new("Test Artist", title),
        analysis,
        ground_truth: None,
    }
}

pub fn theme_profile(theme: &str) -> Profile {
    Profile {
        themes: vec![Theme::new(theme, "", 0.8)],
        ..Default::default()
    }
}

pub fn themed_mood_profile(theme: &str, mood: &str) -> Profile {
    Profile {
        themes: vec![Theme::new(theme, "", 0.8)],
        dominant_mood: Some(DominantMood::new(mood, "described at some length here")),
        ..Default::default()
    }
}
