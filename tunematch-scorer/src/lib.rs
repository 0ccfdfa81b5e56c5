//! # tunematch-scorer
//!
//! Ranks candidate songs against a playlist by blending independently scored
//! aspects (theme, mood, activity, intensity) into one compatibility score,
//! penalizing important aspects that contradict each other.
//!
//! Pipeline per ranking request:
//! 1. [`weights`]: playlist profile -> normalized aspect weights
//! 2. [`compose`]: profile + aspect -> text for the embedding provider
//! 3. [`embedding`]: text -> vector (external service, injected)
//! 4. [`similarity`] / [`contradiction`]: per-aspect similarity and contradiction
//! 5. [`aggregate`] / [`explain`]: final score and rationale
//! 6. [`ranker`]: orchestrates all songs concurrently, stable-sorts the results
//!
//! [`mood`] is a separate strategy comparing two mood descriptions along
//! valence, arousal and dominance.

pub mod aggregate;
pub mod aspect;
pub mod compose;
pub mod contradiction;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod explain;
pub mod matcher;
pub mod mood;
pub mod ranker;
pub mod similarity;
pub mod weights;

pub use aspect::{Aspect, AspectContradictions, AspectSimilarities, AspectWeights};
pub use contradiction::{ContradictionLevel, ContradictionResult};
pub use embedding::{Embedding, EmbeddingError, EmbeddingProvider, HttpEmbeddingClient};
pub use error::{ScoringError, ScoringResult};
pub use matcher::MatchResult;
pub use mood::{MoodAnalyzer, MoodAnchors, MoodCompatibility};
pub use ranker::{MatchRanker, RankOptions, RankingOutcome, SongFailure};
