//! Error types for tunematch-scorer

use thiserror::Error;

use crate::aspect::Aspect;
use crate::embedding::EmbeddingError;

/// Scoring result type
pub type ScoringResult<T> = std::result::Result<T, ScoringError>;

/// Scoring and ranking errors
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Embedding provider failed for one (profile, aspect) pair. Recoverable:
    /// the ranker applies its failure policy.
    #[error("Embedding unavailable for {subject} ({aspect}): {source}")]
    EmbeddingUnavailable {
        subject: String,
        aspect: Aspect,
        #[source]
        source: EmbeddingError,
    },

    /// Caller deadline expired before the embedding call for this pair completed
    #[error("Deadline exceeded while embedding {subject} ({aspect})")]
    DeadlineExceeded { subject: String, aspect: Aspect },

    /// Two vectors of different dimensionality were compared. Always fatal:
    /// the two sides were embedded with different model variants.
    #[error("Vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Caller cancelled the request
    #[error("Ranking request cancelled")]
    Cancelled,

    /// Anchor vocabulary unusable for dimensional mood analysis
    #[error("Invalid mood anchors: {0}")]
    InvalidAnchors(String),
}

impl ScoringError {
    /// Errors no failure policy may absorb
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScoringError::DimensionMismatch { .. }
                | ScoringError::Cancelled
                | ScoringError::InvalidAnchors(_)
        )
    }
}
